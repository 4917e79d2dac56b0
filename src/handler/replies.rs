//! User-facing reply texts

/// Caption sent with the extracted document
pub const DOCUMENT_CAPTION: &str =
    "\u{1f4da} Your document has been successfully extracted from the archive! Happy reading!";

/// Reply when the attachment could not be resolved or downloaded
pub const RETRIEVE_FAILED: &str = "Failed to retrieve the file. Please try again later.";

/// Reply when the downloaded bytes are not a readable ZIP archive
pub const ARCHIVE_INVALID: &str = "Failed to open the archive. Please send a valid zip file.";

/// Welcome/help text for messages without an attachment
#[must_use]
pub fn welcome(extension: &str, max_file_size: u64) -> String {
    format!(
        "Welcome to the Unzip Bot!\n\
         Send me a zip archive containing a .{extension} file and I will extract it for you.\n\
         I can process archives up to {} in size.",
        format_size(max_file_size)
    )
}

/// Reply when the declared attachment size is over the limit
#[must_use]
pub fn file_too_large(max_file_size: u64) -> String {
    format!(
        "The file exceeds the maximum allowed size of {}.",
        format_size(max_file_size)
    )
}

/// Reply when the extracted document is over the limit
#[must_use]
pub fn extracted_too_large(max_file_size: u64) -> String {
    format!(
        "The extracted file exceeds the maximum allowed size of {}.",
        format_size(max_file_size)
    )
}

/// Render a byte count as whole MB when exact, bytes otherwise
fn format_size(bytes: u64) -> String {
    const MIB: u64 = 1024 * 1024;
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{} MB", bytes / MIB)
    } else {
        format!("{bytes} bytes")
    }
}
