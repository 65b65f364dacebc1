/// Where the pool's tokens came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Store,
    Fallback,
    None,
}

/// Ordered tokens plus a round-robin cursor. Tokens are never removed during
/// a run; only the cursor moves.
#[derive(Debug, Clone)]
pub struct TokenPool {
    tokens: Vec<String>,
    cursor: usize,
    source: TokenSource,
}

impl TokenPool {
    pub fn new(tokens: Vec<String>, source: TokenSource) -> Self {
        let source = if tokens.is_empty() {
            TokenSource::None
        } else {
            source
        };
        Self {
            tokens,
            cursor: 0,
            source,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), TokenSource::None)
    }

    pub fn current(&self) -> Option<&str> {
        self.tokens.get(self.cursor).map(String::as_str)
    }

    pub fn advance(&mut self) {
        if self.tokens.is_empty() {
            return;
        }
        self.cursor = (self.cursor + 1) % self.tokens.len();
        tracing::info!("Switching to next token (index: {}).", self.cursor);
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn source(&self) -> TokenSource {
        self.source
    }
}

/// First three characters, for log lines.
pub fn token_hint(token: &str) -> String {
    let prefix: String = token.chars().take(3).collect();
    format!("{}...", prefix)
}
