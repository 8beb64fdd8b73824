//! Human-readable sizes.

/// Format size in human-readable form (binary units).
pub fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert!(format_size(512).ends_with(" B"));
        assert!(format_size(1536).contains("KiB"));
        assert!(format_size(3 * 1024 * 1024).contains("MiB"));
    }
}
