use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::os::unix::fs::OpenOptionsExt;

use log::debug;
use nix::fcntl::{fcntl, FcntlArg};
use nix::unistd::dup2;

use crate::ast::{SimpleCommand, Word};
use crate::environment::Environment;
use crate::executor::ExecError;
use crate::expander::expand_word;

pub const STDIN: RawFd = libc::STDIN_FILENO;
pub const STDOUT: RawFd = libc::STDOUT_FILENO;
pub const STDERR: RawFd = libc::STDERR_FILENO;

const CREATE_MODE: u32 = 0o644;

/// Files opened for a command, each paired with the stream slot it replaces.
pub type RedirectPlan = Vec<(RawFd, File)>;

pub struct RedirectHandler;

impl RedirectHandler {
    /// Opens every target of `cmd` without touching any descriptor yet.
    ///
    /// Input first. Output and error are mutually exclusive paths: output
    /// alone, error alone, or both at once. When both are present output is
    /// always appended and error always truncated, whatever the flags say.
    pub fn plan(cmd: &SimpleCommand, env: &Environment) -> Result<RedirectPlan, ExecError> {
        let mut plan = Vec::new();

        if let Some(input) = &cmd.input {
            plan.push((STDIN, open_read(input, env)?));
        }

        match (&cmd.output, &cmd.error) {
            (Some(out), None) => {
                plan.push((STDOUT, open_write(out, cmd.io_flags.out_append, env)?));
            }
            (Some(out), Some(err)) => {
                plan.push((STDOUT, open_write(out, true, env)?));
                plan.push((STDERR, open_write(err, false, env)?));
            }
            (None, Some(err)) => {
                plan.push((STDERR, open_write(err, cmd.io_flags.err_append, env)?));
            }
            (None, None) => {}
        }

        Ok(plan)
    }

    /// Rewires this process's standard streams for good. Meant for a child
    /// about to load a program.
    pub fn apply(cmd: &SimpleCommand, env: &Environment) -> Result<(), ExecError> {
        for (target, file) in Self::plan(cmd, env)? {
            replace_stream(&file, target)?;
            // `file` closes here, the slot keeps its duplicate.
        }
        Ok(())
    }

    /// Same rewiring, undone when the returned guard is dropped. Used by
    /// builtins that run inside the shell process itself.
    pub fn scoped(cmd: &SimpleCommand, env: &Environment) -> Result<SavedStreams, ExecError> {
        let plan = Self::plan(cmd, env)?;
        let mut saved = SavedStreams { saved: Vec::with_capacity(plan.len()) };

        for (target, file) in plan {
            let copy = fcntl(target, FcntlArg::F_DUPFD_CLOEXEC(3)).map_err(ExecError::Dup)?;
            // SAFETY: fcntl just returned this descriptor and nothing else owns it.
            saved.saved.push((target, unsafe { OwnedFd::from_raw_fd(copy) }));
            flush_stream(target);
            replace_stream(&file, target)?;
        }

        Ok(saved)
    }
}

/// Original standard descriptors put back on drop.
#[derive(Debug)]
pub struct SavedStreams {
    saved: Vec<(RawFd, OwnedFd)>,
}

impl Drop for SavedStreams {
    fn drop(&mut self) {
        while let Some((target, original)) = self.saved.pop() {
            flush_stream(target);
            if let Err(e) = dup2(original.as_raw_fd(), target) {
                log::error!("could not restore descriptor {}: {}", target, e);
            }
        }
    }
}

/// Points `target` at the same open file as `fd`.
pub fn replace_stream(fd: &impl AsRawFd, target: RawFd) -> Result<(), ExecError> {
    debug!("dup2({}, {})", fd.as_raw_fd(), target);
    dup2(fd.as_raw_fd(), target).map_err(ExecError::Dup)?;
    Ok(())
}

fn open_read(word: &Word, env: &Environment) -> Result<File, ExecError> {
    let path = expand_word(word, env);
    File::open(&path).map_err(|source| ExecError::Redirect { path, source })
}

fn open_write(word: &Word, append: bool, env: &Environment) -> Result<File, ExecError> {
    let path = expand_word(word, env);
    OpenOptions::new()
        .write(true)
        .create(true)
        .append(append)
        .truncate(!append)
        .mode(CREATE_MODE)
        .open(&path)
        .map_err(|source| ExecError::Redirect { path, source })
}

fn flush_stream(target: RawFd) {
    let _ = match target {
        STDOUT => io::stdout().flush(),
        STDERR => io::stderr().flush(),
        _ => Ok(()),
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Read;
    use std::os::unix::fs::{MetadataExt, PermissionsExt};
    use nix::fcntl::FdFlag;
    use crate::executor::tests::{holds_in_child, open_fds, path_word};

    fn write_plan(plan: RedirectPlan, text: &str) -> Vec<RawFd> {
        plan.into_iter()
            .map(|(target, mut file)| {
                file.write_all(text.as_bytes()).unwrap();
                target
            })
            .collect()
    }

    #[test]
    fn test_no_targets_no_plan() {
        let cmd = SimpleCommand::from_literals(&["ls"]);
        assert!(RedirectHandler::plan(&cmd, &Environment::new()).unwrap().is_empty());
    }

    #[test]
    fn test_output_truncates_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.txt");
        fs::write(&out, "old content\n").unwrap();

        let cmd = SimpleCommand::from_literals(&["ls"]).with_output(path_word(&out), false);
        let targets = write_plan(RedirectHandler::plan(&cmd, &Environment::new()).unwrap(), "new\n");

        assert_eq!(targets, vec![STDOUT]);
        assert_eq!(fs::read_to_string(&out).unwrap(), "new\n");
    }

    #[test]
    fn test_output_append_keeps_content() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.txt");
        fs::write(&out, "old\n").unwrap();

        let cmd = SimpleCommand::from_literals(&["ls"]).with_output(path_word(&out), true);
        write_plan(RedirectHandler::plan(&cmd, &Environment::new()).unwrap(), "new\n");

        assert_eq!(fs::read_to_string(&out).unwrap(), "old\nnew\n");
    }

    #[test]
    fn test_error_only_honours_its_flag() {
        let dir = tempfile::tempdir().unwrap();
        let err = dir.path().join("err.txt");
        fs::write(&err, "old\n").unwrap();

        let cmd = SimpleCommand::from_literals(&["ls"]).with_error(path_word(&err), true);
        let targets = write_plan(RedirectHandler::plan(&cmd, &Environment::new()).unwrap(), "e\n");

        assert_eq!(targets, vec![STDERR]);
        assert_eq!(fs::read_to_string(&err).unwrap(), "old\ne\n");
    }

    #[test]
    fn test_both_targets_append_output_and_truncate_error() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.txt");
        let err = dir.path().join("err.txt");
        fs::write(&out, "old out\n").unwrap();
        fs::write(&err, "old err\n").unwrap();

        // Flags ask for the opposite; the combined path ignores them.
        let cmd = SimpleCommand::from_literals(&["ls"])
            .with_output(path_word(&out), false)
            .with_error(path_word(&err), true);
        let targets = write_plan(RedirectHandler::plan(&cmd, &Environment::new()).unwrap(), "x\n");

        assert_eq!(targets, vec![STDOUT, STDERR]);
        assert_eq!(fs::read_to_string(&out).unwrap(), "old out\nx\n");
        assert_eq!(fs::read_to_string(&err).unwrap(), "x\n");
    }

    #[test]
    fn test_created_files_use_0644() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("fresh.txt");
        let cmd = SimpleCommand::from_literals(&["ls"]).with_output(path_word(&out), false);
        drop(RedirectHandler::plan(&cmd, &Environment::new()).unwrap());

        let mode = fs::metadata(&out).unwrap().permissions().mode() & 0o777;
        // The umask can only clear bits.
        assert_eq!(mode & !0o644, 0);
        assert_ne!(mode & 0o600, 0);
    }

    #[test]
    fn test_target_is_expanded() {
        let dir = tempfile::tempdir().unwrap();
        let env: Environment = [("DIR", dir.path().to_str().unwrap())].into_iter().collect();
        let cmd = SimpleCommand::from_literals(&["ls"]).with_output(Word::literal("$DIR/x.txt"), false);
        drop(RedirectHandler::plan(&cmd, &env).unwrap());
        assert!(dir.path().join("x.txt").exists());
    }

    #[test]
    fn test_missing_input_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.txt");
        let cmd = SimpleCommand::from_literals(&["cat"]).with_input(path_word(&missing));
        match RedirectHandler::plan(&cmd, &Environment::new()) {
            Err(ExecError::Redirect { path, .. }) => assert_eq!(path, missing.to_str().unwrap()),
            other => panic!("unexpected: {:?}", other.map(|p| p.len())),
        }
    }

    #[test]
    fn test_scoped_input_is_restored() {
        let _guard = crate::executor::tests::stdio_lock();
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.txt");
        fs::write(&input, "hello").unwrap();
        let cmd = SimpleCommand::from_literals(&["cd"]).with_input(path_word(&input));

        // Nothing to save if the harness runs us without a stdin.
        let Ok(before) = nix::sys::stat::fstat(STDIN) else { return };
        {
            let _saved = RedirectHandler::scoped(&cmd, &Environment::new()).unwrap();
            let mut buf = String::new();
            // SAFETY: borrowing fd 0 for the read only; ManuallyDrop keeps it open.
            let mut stdin = std::mem::ManuallyDrop::new(unsafe { File::from_raw_fd(STDIN) });
            stdin.read_to_string(&mut buf).unwrap();
            assert_eq!(buf, "hello");
            assert_eq!(
                nix::sys::stat::fstat(STDIN).unwrap().st_ino as u64,
                fs::metadata(&input).unwrap().ino()
            );
        }
        let after = nix::sys::stat::fstat(STDIN).unwrap();
        assert_eq!((before.st_dev, before.st_ino), (after.st_dev, after.st_ino));
    }

    #[test]
    fn test_saved_streams_are_not_inherited() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.txt");
        let cmd = SimpleCommand::from_literals(&["cd"]).with_output(path_word(&out), false);
        assert!(holds_in_child(|| {
            let before = open_fds();
            let Ok(saved) = RedirectHandler::scoped(&cmd, &Environment::new()) else { return false };
            let added: Vec<RawFd> = open_fds().into_iter().filter(|fd| !before.contains(fd)).collect();
            let all_cloexec = added.iter().all(|&fd| {
                fcntl(fd, FcntlArg::F_GETFD)
                    .map(|flags| FdFlag::from_bits_truncate(flags).contains(FdFlag::FD_CLOEXEC))
                    .unwrap_or(false)
            });
            drop(saved);
            !added.is_empty() && all_cloexec && open_fds() == before
        }));
    }
}
