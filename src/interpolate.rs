//! Placeholder interpolation.
//!
//! Translated (or fallback) strings carry positional `{n}` placeholders.
//! Interpolation splits a string on those placeholders and reinserts the
//! corresponding argument values in order, either flattened to one string or
//! as a chunk sequence that keeps markup nodes as discrete children.

/// One interpolation argument supplied at a call site.
///
/// `N` is the host's opaque renderable node type; the library never looks
/// inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg<N> {
    /// A plain text value.
    Text(String),
    /// A numeric value; stringified as decimal wherever text is needed.
    Num(i64),
    /// An opaque markup node, preserved only by structured interpolation.
    Node(N),
}

impl<N> Arg<N> {
    /// Text form of the argument, or `None` for markup nodes.
    #[must_use]
    pub fn as_fallback_text(&self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text.clone()),
            Self::Num(num) => Some(num.to_string()),
            Self::Node(_) => None,
        }
    }

    /// Returns true for values with a text form.
    #[must_use]
    pub const fn is_primitive(&self) -> bool {
        matches!(self, Self::Text(_) | Self::Num(_))
    }
}

impl<N> From<&str> for Arg<N> {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl<N> From<String> for Arg<N> {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl<N> From<i64> for Arg<N> {
    fn from(num: i64) -> Self {
        Self::Num(num)
    }
}

/// One element of a structured interpolation result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chunk<N> {
    /// Flattened literal text (adjacent text pieces are merged).
    Text(String),
    /// A markup node kept as a discrete child.
    Node(N),
}

/// A parsed piece of a translation string.
enum Piece<'a> {
    /// Literal text between placeholders.
    Literal(&'a str),
    /// A `{n}` placeholder holding its 1-based index.
    Slot(usize),
}

/// Splits `text` into literal pieces and `{n}` slots. Anything that does not
/// parse as `{` digits `}` stays literal.
fn split_placeholders(text: &str) -> Vec<Piece<'_>> {
    let mut pieces = Vec::new();
    let mut literal_start = 0;
    let mut rest = text.char_indices().peekable();

    while let Some((open, ch)) = rest.next() {
        if ch != '{' {
            continue;
        }

        // `{` の直後から数字列と `}` を探す
        let mut digits_end = open + 1;
        while let Some((index, digit)) = rest.peek().copied() {
            if digit.is_ascii_digit() {
                digits_end = index + digit.len_utf8();
                rest.next();
            } else {
                break;
            }
        }

        let Some((close, '}')) = rest.peek().copied() else {
            continue;
        };
        if digits_end == open + 1 {
            // 数字なしの `{}` はリテラル扱い
            continue;
        }

        let Some(digits) = text.get(open + 1..digits_end) else {
            continue;
        };
        let Ok(slot) = digits.parse::<usize>() else {
            continue;
        };

        if let Some(literal) = text.get(literal_start..open)
            && !literal.is_empty()
        {
            pieces.push(Piece::Literal(literal));
        }
        pieces.push(Piece::Slot(slot));

        rest.next();
        literal_start = close + 1;
    }

    if let Some(literal) = text.get(literal_start..)
        && !literal.is_empty()
    {
        pieces.push(Piece::Literal(literal));
    }

    pieces
}

/// Interpolates into a single flat string.
///
/// Placeholder indices are 1-based; an index with no corresponding value
/// (and any markup node, which has no text form) substitutes nothing rather
/// than failing, since a malformed translation must never crash the host.
#[must_use]
pub fn interpolate_plain<N>(text: &str, args: &[Arg<N>]) -> String {
    let mut result = String::new();
    for piece in split_placeholders(text) {
        match piece {
            Piece::Literal(literal) => result.push_str(literal),
            Piece::Slot(slot) => {
                if let Some(value) =
                    slot.checked_sub(1).and_then(|i| args.get(i)).and_then(Arg::as_fallback_text)
                {
                    result.push_str(&value);
                }
            }
        }
    }
    result
}

/// Interpolates into an ordered chunk sequence, keeping markup nodes as
/// discrete children. Produces the same text as [`interpolate_plain`] when
/// every argument is primitive.
#[must_use]
pub fn interpolate_chunks<N: Clone>(text: &str, args: &[Arg<N>]) -> Vec<Chunk<N>> {
    let mut chunks = Vec::new();
    let mut buffer = String::new();

    for piece in split_placeholders(text) {
        match piece {
            Piece::Literal(literal) => buffer.push_str(literal),
            Piece::Slot(slot) => match slot.checked_sub(1).and_then(|i| args.get(i)) {
                Some(Arg::Node(node)) => {
                    if !buffer.is_empty() {
                        chunks.push(Chunk::Text(std::mem::take(&mut buffer)));
                    }
                    chunks.push(Chunk::Node(node.clone()));
                }
                Some(arg) => {
                    if let Some(value) = arg.as_fallback_text() {
                        buffer.push_str(&value);
                    }
                }
                // 範囲外のインデックスは黙って落とす
                None => {}
            },
        }
    }

    if !buffer.is_empty() {
        chunks.push(Chunk::Text(buffer));
    }

    chunks
}
