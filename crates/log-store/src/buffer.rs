/// Unbounded append-only sequence.
///
/// Iteration order is append order (oldest → newest). Nothing is ever
/// evicted; only [`AppendLog::clear`] removes entries.
#[derive(Debug, Clone)]
pub struct AppendLog<T> {
    buf: Vec<T>,
}

impl<T: Clone> AppendLog<T> {
    /// Create an empty log.
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Append a value at the end.
    pub fn push(&mut self, value: T) {
        self.buf.push(value);
    }

    /// Iterate from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.buf.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether the log contains no entries.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Owned copy of every entry. Later mutation of the log does not
    /// affect the returned vector.
    pub fn snapshot(&self) -> Vec<T> {
        self.buf.clone()
    }

    /// Owned copy of the entries matching `pred`, in append order.
    pub fn filtered(&self, mut pred: impl FnMut(&T) -> bool) -> Vec<T> {
        self.buf.iter().filter(|v| pred(v)).cloned().collect()
    }

    /// Remove all entries.
    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

impl<T: Clone> Default for AppendLog<T> {
    fn default() -> Self {
        Self::new()
    }
}
