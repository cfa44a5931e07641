//! OS clipboard providers for runtime hosts.
//!
//! Implements the `the-lib` clipboard trait by shelling out to whatever copy
//! tool the platform offers. Detection happens once, when the host starts.

use std::borrow::Cow;

use the_lib::clipboard::{
  ClipboardError,
  ClipboardProvider,
  Result,
};

/// A program that reads the text to copy from stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
struct CopyCommand {
  command: Cow<'static, str>,
  args:    Cow<'static, [Cow<'static, str>]>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SystemClipboard {
  Pasteboard,
  Wayland,
  XClip,
  XSel,
  Win32Yank,
  Tmux,
  #[cfg(windows)]
  Windows,
  Termux,
  None,
}

impl Default for SystemClipboard {
  fn default() -> Self {
    Self::detect()
  }
}

impl SystemClipboard {
  #[cfg(windows)]
  pub fn detect() -> Self {
    use crate::env::binary_exists;

    if binary_exists("win32yank.exe") {
      Self::Win32Yank
    } else {
      Self::Windows
    }
  }

  #[cfg(target_os = "macos")]
  pub fn detect() -> Self {
    use crate::env::{
      binary_exists,
      env_var_is_set,
    };

    if env_var_is_set("TMUX") && binary_exists("tmux") {
      Self::Tmux
    } else if binary_exists("pbcopy") {
      Self::Pasteboard
    } else {
      Self::None
    }
  }

  #[cfg(not(any(windows, target_os = "macos")))]
  pub fn detect() -> Self {
    use crate::env::{
      binary_exists,
      env_var_is_set,
    };

    if env_var_is_set("WAYLAND_DISPLAY") && binary_exists("wl-copy") {
      Self::Wayland
    } else if env_var_is_set("DISPLAY") && binary_exists("xclip") {
      Self::XClip
    } else if env_var_is_set("DISPLAY") && binary_exists("xsel") {
      Self::XSel
    } else if binary_exists("termux-clipboard-set") {
      Self::Termux
    } else if env_var_is_set("TMUX") && binary_exists("tmux") {
      Self::Tmux
    } else if binary_exists("win32yank.exe") {
      Self::Win32Yank
    } else {
      Self::None
    }
  }

  fn builtin(&self) -> Option<&'static CopyCommand> {
    match self {
      Self::Pasteboard => Some(&PASTEBOARD),
      Self::Wayland => Some(&WL_COPY),
      Self::XClip => Some(&XCLIP),
      Self::XSel => Some(&XSEL),
      Self::Win32Yank => Some(&WIN32),
      Self::Tmux => Some(&TMUX),
      Self::Termux => Some(&TERMUX),
      _ => None,
    }
  }
}

impl ClipboardProvider for SystemClipboard {
  fn name(&self) -> Cow<'_, str> {
    let label = match self {
      Self::Pasteboard => "pasteboard",
      Self::Wayland => "wayland",
      Self::XClip => "x-clip",
      Self::XSel => "x-sel",
      Self::Win32Yank => "win-32-yank",
      Self::Tmux => "tmux",
      Self::Termux => "termux",
      #[cfg(windows)]
      Self::Windows => return "windows".into(),
      Self::None => return "none".into(),
    };
    match self.builtin() {
      Some(command) => Cow::Owned(format!("{label} ({})", command.command)),
      None => label.into(),
    }
  }

  fn set_contents(&self, content: &str) -> Result<()> {
    match self {
      #[cfg(windows)]
      Self::Windows => clipboard_win::set_clipboard(clipboard_win::formats::Unicode, content)
        .map_err(|err| ClipboardError::Platform(err.to_string())),
      Self::None => {
        tracing::debug!("no clipboard provider, dropping copied text");
        Ok(())
      },
      builtin => match builtin.builtin() {
        Some(command) => execute_command(command, content),
        None => Ok(()),
      },
    }
  }
}

macro_rules! copy_command {
  ($name:ident => $cmd:literal $( , $arg:literal )* ;) => {
    const $name: CopyCommand = CopyCommand {
      command: Cow::Borrowed($cmd),
      args: Cow::Borrowed(&[ $( Cow::Borrowed($arg) ),* ]),
    };
  };
}

copy_command!(TMUX => "tmux", "load-buffer", "-w", "-";);
copy_command!(PASTEBOARD => "pbcopy";);
copy_command!(WL_COPY => "wl-copy", "--type", "text/plain";);
copy_command!(XCLIP => "xclip", "-i", "-selection", "clipboard";);
copy_command!(XSEL => "xsel", "-i", "-b";);
copy_command!(WIN32 => "win32yank.exe", "-i", "--crlf";);
copy_command!(TERMUX => "termux-clipboard-set";);

fn execute_command(cmd: &CopyCommand, input: &str) -> Result<()> {
  use std::{
    io::Write,
    process::{
      Command,
      Stdio,
    },
  };

  let mut command = Command::new(cmd.command.as_ref());
  let mut command = command
    .args(cmd.args.iter().map(AsRef::as_ref))
    .stdin(Stdio::piped())
    .stdout(Stdio::null())
    .stderr(Stdio::null());

  // Copy tools like xclip keep running to serve the selection; detach them
  // from our session so they outlive the terminal host.
  #[cfg(unix)]
  {
    use std::os::unix::process::CommandExt;

    unsafe {
      command = command.pre_exec(|| match libc::setsid() {
        -1 => Err(std::io::Error::last_os_error()),
        _ => Ok(()),
      });
    }
  }

  let mut child = command.spawn()?;
  {
    let mut stdin = child.stdin.take().ok_or(ClipboardError::StdinWriteFailed)?;
    stdin
      .write_all(input.as_bytes())
      .map_err(|_| ClipboardError::StdinWriteFailed)?;
  }

  let status = child.wait()?;
  if !status.success() {
    return Err(ClipboardError::CommandFailed);
  }
  Ok(())
}
