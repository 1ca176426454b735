//! Guard for client-supplied file names.
//!
//! Every name that reaches the repository from the network passes through
//! [`is_acceptable`] first. The served directory is flat, so a name is only
//! usable if it cannot address anything outside of it.

use tracing::warn;

const PARENT_DIR: &str = "..";
const SEPARATORS: [char; 2] = ['/', '\\'];

/// Returns false for names containing `..` or a path separator.
///
/// No other normalization happens here; odd but harmless characters are
/// accepted as-is.
pub fn is_acceptable(name: &str) -> bool {
    if name.contains(PARENT_DIR) {
        warn!("Rejected name with parent directory marker: {:?}", name);
        return false;
    }
    if name.contains(SEPARATORS) {
        warn!("Rejected name with path separator: {:?}", name);
        return false;
    }
    true
}
