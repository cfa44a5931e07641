/// Incrementing integer used by the counting commands.
///
/// A counter lives for exactly one command invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Counter {
  next: i64,
}

impl Counter {
  pub fn new(start: i64) -> Self {
    Self { next: start }
  }

  /// Returns the current value and moves on to the following one.
  pub fn advance(&mut self) -> i64 {
    let value = self.next;
    self.next = self.next.saturating_add(1);
    value
  }

  pub fn peek(&self) -> i64 {
    self.next
  }
}
