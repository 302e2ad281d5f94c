#[cfg(test)]
mod tests {
    use tributary_core::{Decoder, TributaryError, Value};
    use tributary_formats::{EnvDecoder, JsonDecoder, TomlDecoder, YamlDecoder, default_registry};

    fn assert_decode_error(err: TributaryError, format: &str) {
        match err {
            TributaryError::Decode { format: f, .. } => assert_eq!(f, format),
            other => panic!("expected decode error, got {other}"),
        }
    }

    // ── JSON ───────────────────────────────────────────────────

    #[test]
    fn test_json_object() {
        let doc = JsonDecoder
            .parse(br#"{"name": "svc", "port": 8080, "debug": false}"#)
            .unwrap();
        assert_eq!(doc.get("name"), Some(&Value::String("svc".into())));
        assert_eq!(doc.get("port"), Some(&Value::Number(8080.0)));
        assert_eq!(doc.get("debug"), Some(&Value::Bool(false)));
    }

    #[test]
    fn test_json_rejects_non_map_top_level() {
        let err = JsonDecoder.parse(b"[1, 2, 3]").unwrap_err();
        assert_decode_error(err, "json");
    }

    #[test]
    fn test_json_malformed_reports_position() {
        let err = JsonDecoder.parse(b"{\n  \"a\": }\n").unwrap_err();
        let TributaryError::Decode { reason, .. } = err else {
            panic!("expected decode error");
        };
        assert!(reason.contains("line"), "reason was: {reason}");
    }

    // ── YAML ───────────────────────────────────────────────────

    #[test]
    fn test_yaml_mapping() {
        let doc = YamlDecoder
            .parse(b"server:\n  host: localhost\n  port: 9000\nenabled: true\n")
            .unwrap();
        let server = doc.get("server").unwrap();
        assert_eq!(server.get("host"), Some(&Value::String("localhost".into())));
        assert_eq!(server.get("port"), Some(&Value::Number(9000.0)));
        assert_eq!(doc.get("enabled"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_yaml_rejects_scalar_top_level() {
        let err = YamlDecoder.parse(b"just a string\n").unwrap_err();
        assert_decode_error(err, "yaml");
    }

    // ── TOML ───────────────────────────────────────────────────

    #[test]
    fn test_toml_table() {
        let doc = TomlDecoder
            .parse(b"title = \"cfg\"\ncount = 3\nratio = 0.5\n\n[owner]\nname = \"ops\"\n")
            .unwrap();
        assert_eq!(doc.get("title"), Some(&Value::String("cfg".into())));
        assert_eq!(doc.get("count"), Some(&Value::Number(3.0)));
        assert_eq!(doc.get("ratio"), Some(&Value::Number(0.5)));
        let owner = doc.get("owner").unwrap();
        assert_eq!(owner.get("name"), Some(&Value::String("ops".into())));
    }

    #[test]
    fn test_toml_arrays_preserve_order() {
        let doc = TomlDecoder.parse(b"steps = [3, 1, 2]\n").unwrap();
        assert_eq!(
            doc.get("steps"),
            Some(&Value::List(vec![
                Value::Number(3.0),
                Value::Number(1.0),
                Value::Number(2.0),
            ]))
        );
    }

    #[test]
    fn test_toml_malformed() {
        let err = TomlDecoder.parse(b"= broken\n").unwrap_err();
        assert_decode_error(err, "toml");
    }

    // ── Env (KEY=VALUE lines) ──────────────────────────────────

    #[test]
    fn test_env_lines() {
        let doc = EnvDecoder
            .parse(b"APP_HOST=localhost\nAPP_PORT=8080\n\nAPP_EMPTY=\n")
            .unwrap();
        assert_eq!(doc.get("APP_HOST"), Some(&Value::String("localhost".into())));
        // Values stay strings; typed mapping happens later.
        assert_eq!(doc.get("APP_PORT"), Some(&Value::String("8080".into())));
        assert_eq!(doc.get("APP_EMPTY"), Some(&Value::String(String::new())));
    }

    #[test]
    fn test_env_value_may_contain_equals() {
        let doc = EnvDecoder.parse(b"APP_DSN=user=u;pass=p\n").unwrap();
        assert_eq!(
            doc.get("APP_DSN"),
            Some(&Value::String("user=u;pass=p".into()))
        );
    }

    #[test]
    fn test_env_line_without_equals_names_the_line() {
        let err = EnvDecoder.parse(b"APP_OK=1\nBROKEN\n").unwrap_err();
        let TributaryError::Decode { reason, .. } = err else {
            panic!("expected decode error");
        };
        assert!(reason.contains("line 2"), "reason was: {reason}");
    }

    #[test]
    fn test_env_empty_input_is_empty_map() {
        let doc = EnvDecoder.parse(b"").unwrap();
        assert_eq!(doc, Value::Map(Default::default()));
    }

    // ── Default registry ───────────────────────────────────────

    #[test]
    fn test_default_registry_has_all_builtins() {
        let registry = default_registry();
        for format in ["json", "yaml", "yml", "toml", "env"] {
            assert!(registry.resolve(format).is_some(), "missing {format}");
        }
        assert!(registry.resolve("ini").is_none());
    }
}
