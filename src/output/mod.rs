//! JSON output for engine records.

use std::io::Write;

use serde::Serialize;

use crate::core::Result;

/// Write `data` as pretty-printed JSON followed by a newline.
pub fn write_json<T: Serialize, W: Write>(data: &T, writer: &mut W) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, data)?;
    writeln!(writer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_write_json_is_pretty_with_trailing_newline() {
        let mut buf = Vec::new();
        write_json(&json!({"composite_score": 0.9}), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "{\n  \"composite_score\": 0.9\n}\n");
    }
}
