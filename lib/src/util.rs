use std::str::FromStr;

use uuid::Uuid;

use crate::error::{ErrorKind, Result};

/// Parses an id taken from a path or query, reporting malformed input as
/// `InvalidId`.
pub fn parse_id(raw: &str) -> Result<Uuid> {
    Uuid::from_str(raw.trim()).map_err(|_| ErrorKind::InvalidId(raw.to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_parse_or_fail_as_invalid() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string()).unwrap(), id);
        let err = parse_id("not-a-uuid").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvalidId(_)));
    }
}
