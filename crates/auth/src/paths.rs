//! Ant-style path classification (open vs. admin-restricted paths).
//!
//! Supported syntax, per `/`-separated segment:
//! - `**` matches zero or more whole segments
//! - `*` matches any run of characters inside one segment
//! - `?` matches exactly one character
//! - `{name}` as a whole segment matches any single segment
//!
//! Literal text is case-sensitive and empty segments are ignored.

const SEPARATOR: char = '/';

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    /// `**`
    AnyDepth,
    /// `{name}`
    Variable,
    /// Literal text, possibly containing `*` / `?`.
    Glob(String),
}

impl Segment {
    fn parse(raw: &str) -> Self {
        if raw == "**" {
            Segment::AnyDepth
        } else if raw.len() > 2 && raw.starts_with('{') && raw.ends_with('}') {
            Segment::Variable
        } else {
            Segment::Glob(raw.to_string())
        }
    }

    fn matches(&self, segment: &str) -> bool {
        match self {
            Segment::AnyDepth | Segment::Variable => true,
            Segment::Glob(glob) => glob_match(glob.as_bytes(), segment.as_bytes()),
        }
    }
}

/// A single compiled path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    absolute: bool,
    trailing_separator: bool,
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Self {
        Self {
            raw: pattern.to_string(),
            absolute: pattern.starts_with(SEPARATOR),
            trailing_separator: pattern.ends_with(SEPARATOR),
            segments: split(pattern).map(Segment::parse).collect(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn matches(&self, path: &str) -> bool {
        if path.starts_with(SEPARATOR) != self.absolute {
            return false;
        }

        let segments: Vec<&str> = split(path).collect();
        if !match_segments(&self.segments, &segments) {
            return false;
        }

        // `/a` must not match `/a/` unless the pattern ends in `**`.
        match self.segments.last() {
            Some(Segment::AnyDepth) => true,
            _ => self.trailing_separator == path.ends_with(SEPARATOR),
        }
    }
}

impl core::fmt::Display for PathPattern {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for PathPattern {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

/// The two ordered rule sets consulted by the gate.
///
/// Built once at startup; any match in a list wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathRules {
    open: Vec<PathPattern>,
    admin: Vec<PathPattern>,
}

impl PathRules {
    pub fn new<O, A>(open: O, admin: A) -> Self
    where
        O: IntoIterator,
        O::Item: AsRef<str>,
        A: IntoIterator,
        A::Item: AsRef<str>,
    {
        Self {
            open: open.into_iter().map(|p| PathPattern::parse(p.as_ref())).collect(),
            admin: admin.into_iter().map(|p| PathPattern::parse(p.as_ref())).collect(),
        }
    }

    /// `true` if the path needs no authentication.
    pub fn is_open(&self, path: &str) -> bool {
        self.open.iter().any(|p| p.matches(path))
    }

    /// `true` if the path is reserved for the ADMIN role.
    pub fn requires_admin(&self, path: &str) -> bool {
        self.admin.iter().any(|p| p.matches(path))
    }

    pub fn open_patterns(&self) -> &[PathPattern] {
        &self.open
    }

    pub fn admin_patterns(&self) -> &[PathPattern] {
        &self.admin
    }
}

fn split(value: &str) -> impl Iterator<Item = &str> {
    value
        .split(SEPARATOR)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn match_segments(pattern: &[Segment], path: &[&str]) -> bool {
    match pattern.split_first() {
        None => path.is_empty(),
        Some((Segment::AnyDepth, rest)) => {
            // Collapse consecutive `**`.
            if matches!(rest.first(), Some(Segment::AnyDepth)) {
                return match_segments(rest, path);
            }
            (0..=path.len()).any(|skip| match_segments(rest, &path[skip..]))
        }
        Some((segment, rest)) => match path.split_first() {
            Some((head, tail)) => segment.matches(head) && match_segments(rest, tail),
            None => false,
        },
    }
}

/// Single-segment glob with `*` and `?`.
fn glob_match(glob: &[u8], text: &[u8]) -> bool {
    let (mut g, mut t) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        match glob.get(g) {
            Some(b'*') => {
                star = Some((g, t));
                g += 1;
            }
            Some(b'?') => {
                g += 1;
                t += 1;
            }
            Some(&c) if c == text[t] => {
                g += 1;
                t += 1;
            }
            _ => match star {
                Some((star_g, star_t)) => {
                    g = star_g + 1;
                    t = star_t + 1;
                    star = Some((star_g, star_t + 1));
                }
                None => return false,
            },
        }
    }

    glob[g..].iter().all(|&c| c == b'*')
}
