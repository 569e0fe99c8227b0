//! Filesystem-safe rendering of metadata values.

/// Filename rule set to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Windows: reserved characters are replaced, a leading `X:\` drive prefix is kept.
    Restrictive,
    /// Unix-like: only the path separator is replaced.
    Permissive,
}

impl Platform {
    /// Rule set for the platform this binary was built for.
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Restrictive
        } else {
            Platform::Permissive
        }
    }
}

const RESTRICTED: &[char] = &['<', '>', ':', '"', '/', '|', '?', '*', '\\'];

/// Replaces characters the target platform cannot store in a path component with `-`.
///
/// On [`Platform::Restrictive`] a leading drive prefix of the exact form `C:\` is preserved.
pub fn sanitize(raw: &str, platform: Platform) -> String {
    match platform {
        Platform::Permissive => raw.replace('/', "-"),
        Platform::Restrictive => {
            let (prefix, rest) = split_drive_prefix(raw);
            let mut out = String::with_capacity(raw.len());
            out.push_str(prefix);
            out.extend(
                rest.chars()
                    .map(|c| if RESTRICTED.contains(&c) { '-' } else { c }),
            );
            out
        }
    }
}

fn split_drive_prefix(raw: &str) -> (&str, &str) {
    let b = raw.as_bytes();
    if b.len() >= 3 && b[0].is_ascii_alphabetic() && b[1] == b':' && b[2] == b'\\' {
        raw.split_at(3)
    } else {
        ("", raw)
    }
}
