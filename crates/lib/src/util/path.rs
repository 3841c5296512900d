/// Whether `s` can be used as a single file or directory name.
///
/// Rejects empty names, `.` and `..`, and anything holding a path separator
/// or a NUL byte.
pub fn is_path_component(s: &str) -> bool {
  !s.is_empty() && s != "." && s != ".." && !s.contains(['/', '\\', '\0'])
}
