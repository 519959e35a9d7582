use crate::editor::{
    CURSOR_LEGACY_FILE, CURSOR_LOCAL_FILE, HostEnv, InstallType, WINDSURF_GLOBAL_FILE,
    WINDSURF_LOCAL_FILE, cursor_rules_dir, windsurf_global_dir,
};
use crate::error::{AirulesError, Result};
use crate::fs_utils::{Deployed, FileSystem, OsFileSystem, deploy};
use crate::remote::{
    ContextReader, Fetcher, RequestContext, RuleSet, RuleSetType, find_rule_set,
};
use std::path::PathBuf;
use tracing::{debug, info};

/// Downloads a remote rule set straight into an editor destination.
pub struct RemoteInstaller {
    fetcher: Box<dyn Fetcher>,
    host: HostEnv,
    fs: Box<dyn FileSystem>,
}

impl RemoteInstaller {
    pub fn new(fetcher: Box<dyn Fetcher>) -> Result<Self> {
        Ok(Self::with_parts(
            fetcher,
            HostEnv::detect()?,
            Box::new(OsFileSystem),
        ))
    }

    pub fn with_parts(fetcher: Box<dyn Fetcher>, host: HostEnv, fs: Box<dyn FileSystem>) -> Self {
        Self { fetcher, host, fs }
    }

    pub fn list_rule_sets(&self, ctx: &RequestContext) -> Result<Vec<RuleSet>> {
        self.fetcher.list_rule_sets(ctx)
    }

    pub fn destination_for(&self, kind: RuleSetType, install_type: InstallType) -> Result<PathBuf> {
        let host = &self.host;
        match (kind, install_type) {
            (RuleSetType::Unknown, _) => Err(AirulesError::UnsupportedRuleSetType { kind }),
            (_, InstallType::All) => {
                let err = AirulesError::UnsupportedRemoteInstallType { kind, install_type };
                Err(err)
            }
            (RuleSetType::Cursor, InstallType::Local) => {
                Ok(cursor_rules_dir(host).join(CURSOR_LOCAL_FILE))
            }
            (RuleSetType::Cursor, InstallType::Global) => {
                Ok(host.working_dir.join(CURSOR_LEGACY_FILE))
            }
            (RuleSetType::Windsurf, InstallType::Local) => {
                Ok(host.working_dir.join(WINDSURF_LOCAL_FILE))
            }
            (RuleSetType::Windsurf, InstallType::Global) => {
                Ok(windsurf_global_dir(host).join(WINDSURF_GLOBAL_FILE))
            }
        }
    }

    pub fn install_rule_set(
        &self,
        ctx: &RequestContext,
        rule_set: &RuleSet,
        install_type: InstallType,
    ) -> Result<Deployed> {
        let destination = self.destination_for(rule_set.kind, install_type)?;
        debug!(
            rule_set = %rule_set.name,
            destination = %destination.display(),
            "resolved remote destination"
        );

        let stream = self.fetcher.fetch_rule_set(ctx, rule_set)?;
        let mut reader = ContextReader::new(stream, ctx.clone());
        let deployed = deploy(self.fs.as_ref(), &destination, &mut reader).map_err(|err| {
            // Reads aborted by the context or the stream surface as write errors; report the cause.
            if let Err(ctx_err) = ctx.check() {
                return ctx_err;
            }
            match reader.take_source_error() {
                Some(source) => AirulesError::Download {
                    name: rule_set.name.clone(),
                    source,
                },
                None => err,
            }
        })?;

        info!(
            rule_set = %rule_set.name,
            destination = %deployed.destination.display(),
            "installed remote rule set"
        );
        Ok(deployed)
    }

    pub fn install_rule_set_by_name(
        &self,
        ctx: &RequestContext,
        name: &str,
        install_type: InstallType,
    ) -> Result<Deployed> {
        let rule_set = find_rule_set(self.list_rule_sets(ctx)?, name)?;
        self.install_rule_set(ctx, &rule_set, install_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::remote::RuleStream;
    use std::cell::Cell;
    use std::fs;
    use std::io::{self, Read};
    use std::rc::Rc;
    use tempfile::TempDir;

    #[derive(Default)]
    struct StubFetcher {
        rule_sets: Vec<RuleSet>,
        body: &'static str,
        fetches: Rc<Cell<usize>>,
    }

    impl Fetcher for StubFetcher {
        fn list_rule_sets(&self, ctx: &RequestContext) -> Result<Vec<RuleSet>> {
            ctx.check()?;
            Ok(self.rule_sets.clone())
        }

        fn fetch_rule_set(&self, ctx: &RequestContext, _rule_set: &RuleSet) -> Result<RuleStream> {
            ctx.check()?;
            self.fetches.set(self.fetches.get() + 1);
            Ok(Box::new(self.body.as_bytes()))
        }
    }

    /// Cancels its context while handing out the first chunk.
    struct CancellingStream {
        ctx: RequestContext,
        sent: bool,
    }

    impl Read for CancellingStream {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.sent {
                return Ok(0);
            }
            self.sent = true;
            self.ctx.cancel();
            let chunk = b"partial";
            buf[..chunk.len()].copy_from_slice(chunk);
            Ok(chunk.len())
        }
    }

    struct CancellingFetcher {
        ctx: RequestContext,
    }

    impl Fetcher for CancellingFetcher {
        fn list_rule_sets(&self, _ctx: &RequestContext) -> Result<Vec<RuleSet>> {
            Ok(Vec::new())
        }

        fn fetch_rule_set(&self, _ctx: &RequestContext, _rule_set: &RuleSet) -> Result<RuleStream> {
            Ok(Box::new(CancellingStream {
                ctx: self.ctx.clone(),
                sent: false,
            }))
        }
    }

    /// Hands out one chunk, then fails like a dropped connection.
    struct DroppedStream {
        sent: bool,
    }

    impl Read for DroppedStream {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.sent {
                return Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset"));
            }
            self.sent = true;
            let chunk = b"partial";
            buf[..chunk.len()].copy_from_slice(chunk);
            Ok(chunk.len())
        }
    }

    struct DroppingFetcher;

    impl Fetcher for DroppingFetcher {
        fn list_rule_sets(&self, _ctx: &RequestContext) -> Result<Vec<RuleSet>> {
            Ok(Vec::new())
        }

        fn fetch_rule_set(&self, _ctx: &RequestContext, _rule_set: &RuleSet) -> Result<RuleStream> {
            Ok(Box::new(DroppedStream { sent: false }))
        }
    }

    fn rule_set(name: &str) -> RuleSet {
        RuleSet {
            name: name.to_string(),
            description: String::new(),
            url: String::new(),
            path: format!("rules/{name}"),
            kind: RuleSetType::classify(name),
        }
    }

    fn host(temp: &TempDir) -> HostEnv {
        HostEnv::new(temp.path().join("home"), temp.path().join("project"))
    }

    fn installer(temp: &TempDir, fetcher: impl Fetcher + 'static) -> RemoteInstaller {
        RemoteInstaller::with_parts(Box::new(fetcher), host(temp), Box::new(OsFileSystem))
    }

    #[test]
    fn destination_table() {
        let temp = TempDir::new().unwrap();
        let installer = installer(&temp, StubFetcher::default());
        let project = temp.path().join("project");
        let home = temp.path().join("home");

        assert_eq!(
            installer
                .destination_for(RuleSetType::Cursor, InstallType::Local)
                .unwrap(),
            project.join(".cursor/rules/project_rules.mdc")
        );
        assert_eq!(
            installer
                .destination_for(RuleSetType::Cursor, InstallType::Global)
                .unwrap(),
            project.join(".cursorrules")
        );
        assert_eq!(
            installer
                .destination_for(RuleSetType::Windsurf, InstallType::Local)
                .unwrap(),
            project.join(".windsurfrules")
        );
        assert_eq!(
            installer
                .destination_for(RuleSetType::Windsurf, InstallType::Global)
                .unwrap(),
            home.join(".codeium/windsurf/memories/global_rules.md")
        );
    }

    #[test]
    fn unknown_kind_and_all_are_rejected() {
        let temp = TempDir::new().unwrap();
        let installer = installer(&temp, StubFetcher::default());

        let unknown = installer
            .destination_for(RuleSetType::Unknown, InstallType::Local)
            .unwrap_err();
        assert!(matches!(unknown, AirulesError::UnsupportedRuleSetType { .. }));
        match installer.destination_for(RuleSetType::Cursor, InstallType::All) {
            Err(AirulesError::UnsupportedRemoteInstallType { .. }) => {}
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn unsupported_kind_fails_before_fetching() {
        let temp = TempDir::new().unwrap();
        let fetches = Rc::new(Cell::new(0));
        let fetcher = StubFetcher {
            fetches: Rc::clone(&fetches),
            body: "unused",
            ..StubFetcher::default()
        };

        let err = installer(&temp, fetcher)
            .install_rule_set(
                &RequestContext::background(),
                &rule_set("plain-rules"),
                InstallType::Local,
            )
            .unwrap_err();

        assert!(matches!(err, AirulesError::UnsupportedRuleSetType { .. }));
        assert_eq!(fetches.get(), 0);
    }

    #[test]
    fn install_writes_body_and_backs_up() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("project/.windsurfrules");
        fs::create_dir_all(dest.parent().unwrap()).unwrap();
        fs::write(&dest, "mine").unwrap();
        let fetcher = StubFetcher {
            body: "remote rules",
            ..StubFetcher::default()
        };

        let deployed = installer(&temp, fetcher)
            .install_rule_set(
                &RequestContext::background(),
                &rule_set("python-windsurf"),
                InstallType::Local,
            )
            .unwrap();

        assert_eq!(deployed.destination, dest);
        assert_eq!(fs::read_to_string(&dest).unwrap(), "remote rules");
        let backup = deployed.backup.unwrap();
        assert_eq!(fs::read_to_string(backup).unwrap(), "mine");
    }

    #[test]
    fn install_by_name_requires_exact_match() {
        let temp = TempDir::new().unwrap();
        let fetcher = StubFetcher {
            rule_sets: vec![rule_set("react-cursorrules-prompt-file")],
            body: "react",
            ..StubFetcher::default()
        };
        let installer = installer(&temp, fetcher);
        let ctx = RequestContext::background();

        let err = installer
            .install_rule_set_by_name(&ctx, "react", InstallType::Local)
            .unwrap_err();
        assert!(matches!(err, AirulesError::RuleSetNotFound { .. }));

        let name = "react-cursorrules-prompt-file";
        let deployed = installer
            .install_rule_set_by_name(&ctx, name, InstallType::Global)
            .unwrap();
        assert_eq!(fs::read_to_string(deployed.destination).unwrap(), "react");
    }

    #[test]
    fn cancelled_context_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let ctx = RequestContext::background();
        ctx.cancel();
        let fetcher = StubFetcher {
            body: "never",
            ..StubFetcher::default()
        };

        let err = installer(&temp, fetcher)
            .install_rule_set(&ctx, &rule_set("x-cursorrules"), InstallType::Local)
            .unwrap_err();

        assert!(matches!(err, AirulesError::Cancelled));
        assert!(!temp.path().join("project").exists());
    }

    #[test]
    fn cancellation_mid_stream_keeps_previous_file() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("project/.cursor/rules/project_rules.mdc");
        fs::create_dir_all(dest.parent().unwrap()).unwrap();
        fs::write(&dest, "before").unwrap();
        let ctx = RequestContext::background();
        let fetcher = CancellingFetcher { ctx: ctx.clone() };

        let err = installer(&temp, fetcher)
            .install_rule_set(&ctx, &rule_set("x-cursorrules"), InstallType::Local)
            .unwrap_err();

        assert!(matches!(err, AirulesError::Cancelled));
        assert_eq!(fs::read_to_string(&dest).unwrap(), "before");
    }

    #[test]
    fn dropped_stream_is_a_download_error() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("project/.windsurfrules");
        fs::create_dir_all(dest.parent().unwrap()).unwrap();
        fs::write(&dest, "before").unwrap();

        let err = installer(&temp, DroppingFetcher)
            .install_rule_set(
                &RequestContext::background(),
                &rule_set("go-windsurf"),
                InstallType::Local,
            )
            .unwrap_err();

        assert!(matches!(err, AirulesError::Download { ref name, .. } if name == "go-windsurf"));
        assert_eq!(err.kind(), ErrorKind::RemoteFetch);
        assert_eq!(fs::read_to_string(&dest).unwrap(), "before");
    }
}
