use crate::error::PeechyError;

/// JSON-style quoting, used for names and text in error messages.
pub fn quote(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{}\"", text))
}

pub fn syntax_error(msg: &str, line: usize, column: usize) -> PeechyError {
    PeechyError::Syntax {
        msg: msg.to_string(),
        line,
        column,
    }
}

pub fn semantic_error(msg: &str, line: usize, column: usize) -> PeechyError {
    PeechyError::Semantic {
        msg: msg.to_string(),
        line,
        column,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_escapes_like_json() {
        assert_eq!(quote("Point"), "\"Point\"");
        assert_eq!(quote("a\"b"), "\"a\\\"b\"");
        assert_eq!(quote("\n"), "\"\\n\"");
    }
}
