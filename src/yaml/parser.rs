//! YAML parsing with error handling

use serde::de::DeserializeOwned;

use crate::yaml::diagnostics::{YamlError, YamlSyntaxError};

/// Parse YAML content into a typed value with nice error messages
pub fn parse_yaml<T: DeserializeOwned>(content: &str, filename: &str) -> Result<T, YamlError> {
    serde_yml::from_str(content).map_err(|e| {
        YamlError::Syntax(YamlSyntaxError::from_serde_error(&e, content, filename))
    })
}

/// Parse YAML from a file path
pub fn parse_yaml_file<T: DeserializeOwned>(path: &std::path::Path) -> Result<T, YamlError> {
    let content = std::fs::read_to_string(path)?;
    let filename = path.display().to_string();
    parse_yaml(&content, &filename)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Site {
        name: String,
        radius: f64,
    }

    #[test]
    fn test_parse_valid_yaml() {
        let yaml = "name: Head office\nradius: 150.5";
        let result: Site = parse_yaml(yaml, "site.yaml").unwrap();
        assert_eq!(result.name, "Head office");
        assert_eq!(result.radius, 150.5);
    }

    #[test]
    fn test_parse_invalid_yaml_names_the_file() {
        let yaml = "name: test\n  invalid indentation";
        let err = parse_yaml::<Site>(yaml, "broken.yaml").unwrap_err();
        assert!(err.to_string().contains("broken.yaml"));
    }

    #[test]
    fn test_parse_missing_file_is_io_error() {
        let err = parse_yaml_file::<Site>(std::path::Path::new("/nonexistent/site.yaml")).unwrap_err();
        assert!(matches!(err, YamlError::Io(_)));
    }
}
