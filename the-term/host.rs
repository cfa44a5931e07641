//! Line-based [`Host`] for the terminal.
//!
//! Prompts are answered one line at a time: each line becomes the prompt's
//! input and is accepted right away, and end of input dismisses the prompt.

use std::{
  collections::VecDeque,
  io::{
    BufRead,
    Write,
  },
};

use the_calc::{
  Host,
  prompt::{
    PromptEvent,
    PromptView,
  },
};
use the_lib::{
  clipboard::ClipboardProvider,
  document::Document,
};

pub struct TerminalHost<R, W> {
  doc:       Option<Document>,
  input:     R,
  output:    W,
  pending:   VecDeque<PromptEvent>,
  last_hint: Option<String>,
  clipboard: Box<dyn ClipboardProvider>,
}

impl<R: BufRead, W: Write> TerminalHost<R, W> {
  pub fn new(
    doc: Option<Document>,
    input: R,
    output: W,
    clipboard: Box<dyn ClipboardProvider>,
  ) -> Self {
    Self {
      doc,
      input,
      output,
      pending: VecDeque::new(),
      last_hint: None,
      clipboard,
    }
  }

  pub fn document(&self) -> Option<&Document> {
    self.doc.as_ref()
  }

  pub fn into_document(self) -> Option<Document> {
    self.doc
  }

  fn read_answer(&mut self, view: &PromptView) -> PromptEvent {
    if let Err(err) = write!(self.output, "{} [{}] > ", view.prompt, view.placeholder)
      .and_then(|()| self.output.flush())
    {
      tracing::warn!(%err, "failed to write prompt");
    }

    let mut line = String::new();
    match self.input.read_line(&mut line) {
      Ok(0) => PromptEvent::Abort,
      Ok(_) => {
        let answer = line.trim_end_matches(['\r', '\n']).to_owned();
        self.pending.push_back(PromptEvent::Validate);
        PromptEvent::Update(answer)
      },
      Err(err) => {
        tracing::warn!(%err, "failed to read prompt input");
        PromptEvent::Abort
      },
    }
  }
}

impl<R: BufRead, W: Write> Host for TerminalHost<R, W> {
  fn active_document(&mut self) -> Option<&mut Document> {
    self.doc.as_mut()
  }

  fn prompt(&mut self, view: &PromptView) -> PromptEvent {
    if view.hint != self.last_hint {
      if let Some(hint) = &view.hint
        && let Err(err) = writeln!(self.output, "  {hint}")
      {
        tracing::warn!(%err, "failed to write prompt hint");
      }
      self.last_hint = view.hint.clone();
    }

    match self.pending.pop_front() {
      Some(event) => event,
      None => self.read_answer(view),
    }
  }

  fn clipboard(&self) -> &dyn ClipboardProvider {
    self.clipboard.as_ref()
  }
}

#[cfg(test)]
mod tests {
  use std::{
    io::{
      self,
      Cursor,
    },
    num::NonZeroUsize,
  };

  use ropey::Rope;
  use the_calc::{
    Evaluator,
    Session,
    config::StaticConfig,
    prompt::INVALID_INTEGER_HINT,
  };
  use the_lib::{
    clipboard::MemoryClipboard,
    document::DocumentId,
    selection::Selection,
  };

  use super::*;

  fn doc(text: &str, selection: Selection) -> Document {
    let mut doc = Document::new(DocumentId::new(NonZeroUsize::MIN), Rope::from(text));
    doc.set_selection(selection).unwrap();
    doc
  }

  struct ClosedOutput;

  impl Write for ClosedOutput {
    fn write(&mut self, _: &[u8]) -> io::Result<usize> {
      Err(io::ErrorKind::BrokenPipe.into())
    }

    fn flush(&mut self) -> io::Result<()> {
      Err(io::ErrorKind::BrokenPipe.into())
    }
  }

  fn session() -> Session {
    Session::new(Evaluator::default(), Box::new(StaticConfig::default()))
  }

  #[test]
  fn lines_are_updates_followed_by_accept() {
    let mut host = TerminalHost::new(
      None,
      Cursor::new("1+1\n"),
      Vec::new(),
      Box::new(MemoryClipboard::default()),
    );
    let view = PromptView {
      prompt:      "p",
      placeholder: "x",
      input:       String::new(),
      hint:        None,
    };

    assert_eq!(host.prompt(&view), PromptEvent::Update("1+1".into()));
    assert_eq!(host.prompt(&view), PromptEvent::Validate);
    assert_eq!(host.prompt(&view), PromptEvent::Abort);
  }

  #[test]
  fn count_from_reads_until_valid() {
    let selection = Selection::point(0).push(the_lib::selection::Range::point(2));
    let mut host = TerminalHost::new(
      Some(doc("a\nb", selection)),
      Cursor::new("ten\n10\n"),
      Vec::new(),
      Box::new(MemoryClipboard::default()),
    );

    session().execute("calculator.countFrom", &mut host).unwrap();

    let output = String::from_utf8(host.output.clone()).unwrap();
    assert!(output.contains(INVALID_INTEGER_HINT));
    assert_eq!(host.document().unwrap().text().to_string(), "10a\n11b");
  }

  #[test]
  fn end_of_input_dismisses() {
    let mut host = TerminalHost::new(
      Some(doc("a", Selection::point(0))),
      Cursor::new(""),
      Vec::new(),
      Box::new(MemoryClipboard::default()),
    );

    session().execute("calculator.countFrom", &mut host).unwrap();
    assert_eq!(host.document().unwrap().text().to_string(), "a");
  }

  #[test]
  fn show_input_prints_live_result() {
    let mut host = TerminalHost::new(
      None,
      Cursor::new("6*7\n"),
      Vec::new(),
      Box::new(MemoryClipboard::default()),
    );

    session().execute("calculator.showInput", &mut host).unwrap();
    let output = String::from_utf8(host.output).unwrap();
    assert!(output.contains("  42\n"));
  }

  #[test]
  fn closed_output_still_reads_answers() {
    let mut host = TerminalHost::new(
      Some(doc("a", Selection::point(0))),
      Cursor::new("5\n"),
      ClosedOutput,
      Box::new(MemoryClipboard::default()),
    );

    session().execute("calculator.countFrom", &mut host).unwrap();
    assert_eq!(host.document().unwrap().text().to_string(), "5a");
  }
}
