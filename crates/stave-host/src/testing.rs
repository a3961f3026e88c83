//! Test support: a scripted in-memory guest standing in for the real
//! virtual-machine engine.
//!
//! The scripted guest behaves like a tiny compiler: it reads the submitted
//! source from `/app`, emits some output lines, exercises the poll import
//! through its own fake linear memory, and writes artifact files back into
//! the tree. Used by this crate's integration tests and by the worker
//! crate's.

use stave_abi::layout;

use crate::error::{LoadError, TrapError};
use crate::host::{GuestCtx, GuestInstance, InstanceHost};
use crate::vfs::{Node, APP_MOUNT};

/// What a [`ScriptedGuest`] does when run.
#[derive(Debug, Clone, Default)]
pub struct GuestScript {
    /// Lines written to standard output.
    pub stdout_lines: Vec<String>,
    /// Lines written to standard error.
    pub stderr_lines: Vec<String>,
    /// Artifacts written into `/app` after "compiling": name and content.
    /// The content has the submitted source appended, so tests can check
    /// the request's data flowed through.
    pub artifacts: Vec<(String, Vec<u8>)>,
    /// Issue one clock poll through the import trampoline before writing
    /// artifacts, the way the real toolchain's event loop does.
    pub poll_before_write: bool,
    /// Also write `argv.txt` with the space-joined argv, so tests can see
    /// what command line the instance was bound to.
    pub record_argv: bool,
    /// Trap with this message instead of completing.
    pub trap: Option<String>,
}

impl GuestScript {
    /// A well-behaved compiler producing one artifact.
    pub fn engraver() -> Self {
        Self {
            stdout_lines: vec!["Processing score".to_string()],
            stderr_lines: vec!["warning: no version statement".to_string()],
            artifacts: vec![("main.png".to_string(), b"PNG:".to_vec())],
            poll_before_write: true,
            record_argv: false,
            trap: None,
        }
    }
}

/// Host that instantiates [`ScriptedGuest`]s.
#[derive(Debug, Clone, Default)]
pub struct ScriptedHost {
    /// Script given to every instance.
    pub script: GuestScript,
    /// Fail instantiation with this message.
    pub fail_load: Option<String>,
    /// Fail instantiation once this many have succeeded, simulating an
    /// engine that can no longer re-instantiate.
    pub fail_load_after: Option<usize>,
    /// Number of successful instantiations so far.
    pub instantiations: usize,
}

impl ScriptedHost {
    /// Host whose instances follow `script`.
    pub fn new(script: GuestScript) -> Self {
        Self {
            script,
            ..Self::default()
        }
    }

    /// Host whose instantiation always fails.
    pub fn failing(message: &str) -> Self {
        Self {
            fail_load: Some(message.to_string()),
            ..Self::default()
        }
    }
}

impl InstanceHost for ScriptedHost {
    type Instance = ScriptedGuest;

    fn instantiate(&mut self, module: &[u8], argv: &[String]) -> Result<ScriptedGuest, LoadError> {
        if let Some(message) = &self.fail_load {
            return Err(LoadError(message.clone()));
        }
        if self
            .fail_load_after
            .is_some_and(|limit| self.instantiations >= limit)
        {
            return Err(LoadError("engine cannot re-instantiate".to_string()));
        }
        if module.is_empty() {
            return Err(LoadError("empty module".to_string()));
        }
        self.instantiations += 1;
        Ok(ScriptedGuest {
            script: self.script.clone(),
            argv: argv.to_vec(),
            memory: vec![0u8; 4096],
        })
    }
}

/// A scripted one-shot guest instance.
#[derive(Debug)]
pub struct ScriptedGuest {
    script: GuestScript,
    /// Captured at instantiation, the way a real instance bakes in argv.
    pub argv: Vec<String>,
    memory: Vec<u8>,
}

impl GuestInstance for ScriptedGuest {
    fn run(&mut self, ctx: &mut GuestCtx<'_>) -> Result<(), TrapError> {
        for line in &self.script.stdout_lines {
            ctx.stdout.write(line.as_bytes(), ctx.events);
            ctx.stdout.write(b"\n", ctx.events);
        }
        for line in &self.script.stderr_lines {
            ctx.stderr.write(line.as_bytes(), ctx.events);
            ctx.stderr.write(b"\n", ctx.events);
        }

        if let Some(message) = &self.script.trap {
            return Err(TrapError(message.clone()));
        }

        if self.script.poll_before_write {
            self.poll_once(ctx)?;
        }

        // The submitted source is the first (typically only) leaf in /app
        // when the run starts.
        let source = match ctx.vfs.mount(APP_MOUNT).and_then(first_file) {
            Some(bytes) => bytes,
            None => return Err(TrapError("no source file in /app".to_string())),
        };

        for (name, content) in &self.script.artifacts {
            let mut bytes = content.clone();
            bytes.extend_from_slice(&source);
            ctx.vfs.write_file(APP_MOUNT, name, bytes);
        }
        if self.script.record_argv {
            ctx.vfs
                .write_file(APP_MOUNT, "argv.txt", self.argv.join(" ").into_bytes());
        }
        Ok(())
    }
}

impl ScriptedGuest {
    /// One clock subscription through the poll trampoline, checking the
    /// event comes back with the same userdata.
    fn poll_once(&mut self, ctx: &mut GuestCtx<'_>) -> Result<(), TrapError> {
        const IN_PTR: u32 = 0;
        const OUT_PTR: u32 = 256;
        const NEVENTS_PTR: u32 = 512;
        const USERDATA: u64 = 0x5745_4C4C;

        self.memory[..8].copy_from_slice(&USERDATA.to_le_bytes());
        self.memory[layout::SUBSCRIPTION_TAG_OFFSET] = layout::EVENTTYPE_CLOCK;
        self.memory[layout::SUBSCRIPTION_TIMEOUT_OFFSET..layout::SUBSCRIPTION_TIMEOUT_OFFSET + 8]
            .copy_from_slice(&1_000_000u64.to_le_bytes());

        let errno = ctx
            .poll
            .poll_oneoff(&mut self.memory, IN_PTR, OUT_PTR, 1, NEVENTS_PTR);
        if errno != 0 {
            return Err(TrapError(format!("poll_oneoff failed with errno {errno}")));
        }
        let mut userdata = [0u8; 8];
        userdata.copy_from_slice(&self.memory[OUT_PTR as usize..OUT_PTR as usize + 8]);
        if u64::from_le_bytes(userdata) != USERDATA {
            return Err(TrapError("poll event userdata mismatch".to_string()));
        }
        Ok(())
    }
}

fn first_file(app: &crate::vfs::DirTree) -> Option<Vec<u8>> {
    app.iter().find_map(|(_, node)| match node {
        Node::File(bytes) => Some(bytes.clone()),
        Node::Dir(_) => None,
    })
}
