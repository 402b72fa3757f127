use crate::error::Result;

/// `txt`, `md` and `text` files. Invalid UTF-8 is replaced, not rejected.
pub struct PlainTextExtractor;

impl PlainTextExtractor {
    pub fn extract(bytes: &[u8]) -> Result<String> {
        let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF][..]).unwrap_or(bytes);
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}
