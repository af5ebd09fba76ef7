/// Strips the final extension from a file name.
///
/// `photo.final.png` becomes `photo.final`. A trailing dot with nothing after it
/// is left alone.
pub fn remove_extension(filename: &str) -> &str {
    match filename.rfind('.') {
        Some(pos) if pos + 1 < filename.len() && !filename[pos + 1..].contains('/') => {
            &filename[..pos]
        }
        _ => filename,
    }
}

/// Percentage saved going from `original` bytes to `new` bytes, rounded.
/// Negative when the output grew.
pub fn size_reduction_percent(original: u64, new: u64) -> i64 {
    if original == 0 {
        return 0;
    }
    let reduction = (original as f64 - new as f64) / original as f64 * 100.0;
    reduction.round() as i64
}

pub fn format_kb(bytes: u64) -> String {
    format!("{:.1} KB", bytes as f64 / 1024.0)
}
