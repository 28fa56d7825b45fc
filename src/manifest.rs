use serde_json::{json, Value};

use crate::resolver::NATIVE_PREFIX;

pub const ADDON_ID: &str = "org.trailio.addon";
pub const ADDON_NAME: &str = "Trailio";

/// Stremio capability descriptor. `configuration_required` is false once a
/// TMDb key is known, whether from the caller or from the server.
pub fn build_manifest(configuration_required: bool) -> Value {
    json!({
        "id": ADDON_ID,
        "version": env!("CARGO_PKG_VERSION"),
        "name": ADDON_NAME,
        "description": "Trailers, making-of and ending-explained videos from TMDb and YouTube.",
        "resources": ["stream"],
        "types": ["movie", "series"],
        "idPrefixes": ["tt", NATIVE_PREFIX],
        "catalogs": [],
        "behaviorHints": {
            "configurable": true,
            "configurationRequired": configuration_required
        },
        "config": [
            {
                "key": "tmdb_key",
                "type": "text",
                "title": "TMDb API key",
                "required": true
            },
            {
                "key": "serp_key",
                "type": "text",
                "title": "SerpAPI key (optional, enables making-of and ending explained)"
            },
            {
                "key": "lang",
                "type": "select",
                "title": "Language",
                "options": ["en-US", "es-ES", "es-MX", "fr-FR", "de-DE", "it-IT", "pt-BR"],
                "default": "en-US"
            }
        ]
    })
}

pub const CONFIGURE_PAGE: &str = r#"<!doctype html>
<html lang="en">
<head><meta charset="utf-8"><title>Trailio</title></head>
<body>
<h1>Trailio</h1>
<form id="cfg">
  <label>TMDb API key <input name="tmdb_key" required></label><br>
  <label>SerpAPI key <input name="serp_key"></label><br>
  <label>Language <input name="lang" value="en-US"></label><br>
  <button type="submit">Install</button>
</form>
<script>
document.getElementById('cfg').addEventListener('submit', function (e) {
  e.preventDefault();
  var data = {};
  new FormData(e.target).forEach(function (v, k) { if (v) data[k] = v; });
  var segment = encodeURIComponent(JSON.stringify(data));
  window.location.href = 'stremio://' + window.location.host + '/' + segment + '/manifest.json';
});
</script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_reflects_configuration_state() {
        let m = build_manifest(true);
        assert_eq!(m["behaviorHints"]["configurationRequired"], true);
        assert_eq!(m["resources"][0], "stream");
        assert_eq!(m["idPrefixes"][1], "tmdb:");
        assert_eq!(build_manifest(false)["behaviorHints"]["configurationRequired"], false);
    }
}
