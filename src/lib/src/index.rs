//! # Index Mirror
//!
//! Local working copy of the upstream registry index git repository. All git
//! plumbing lives behind this module: clone, fast-forward pull, HEAD reset,
//! commit-to-commit diff, and the local `config.json` amend commit.
//!

use std::path::{Path, PathBuf};

use git2::build::CheckoutBuilder;
use git2::{BranchType, Delta, DiffFindOptions, Oid, Repository, ResetType, Signature};

use crate::constants::{
    CONFIG_COMMIT_MESSAGE, DEFAULT_BRANCH_NAME, DEFAULT_ORIGIN_NAME, INDEX_CONFIG_FILENAME,
    MIRROR_COMMITTER_EMAIL, MIRROR_COMMITTER_NAME,
};
use crate::error::MirrorError;
use crate::model::{IndexChange, IndexConfig};
use crate::util;

pub struct IndexRepository {
    repo: Repository,
    path: PathBuf,
}

impl IndexRepository {
    /// Open the index working tree at `path`, cloning from `url` first when
    /// the directory is missing or empty.
    pub fn ensure_cloned(url: &str, path: impl AsRef<Path>) -> Result<IndexRepository, MirrorError> {
        let path = path.as_ref();
        let repo = if util::fs::is_missing_or_empty_dir(path)? {
            log::warn!("Cloning registry index from {url}, which may take a while.");
            Repository::clone(url, path)?
        } else {
            Repository::open(path)?
        };
        Ok(IndexRepository {
            repo,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Object id of HEAD as lowercase hex.
    pub fn current_commit(&self) -> Result<String, MirrorError> {
        let commit = self.repo.head()?.peel_to_commit()?;
        Ok(commit.id().to_string())
    }

    /// Hard-reset `master` to `origin/master` when the local branch is
    /// strictly ahead. Discards a previous `config.json` amend commit before
    /// pulling; a branch that is merely behind is left alone.
    pub fn reset_head_to_upstream(&self) -> Result<(), MirrorError> {
        let upstream_name = format!("{DEFAULT_ORIGIN_NAME}/{DEFAULT_BRANCH_NAME}");
        let local_oid = self.branch_oid(DEFAULT_BRANCH_NAME, BranchType::Local)?;
        let upstream_oid = self.branch_oid(&upstream_name, BranchType::Remote)?;

        // origin/master..master: fires only when local commits exist on top
        // of upstream
        let (ahead, _behind) = self.repo.graph_ahead_behind(local_oid, upstream_oid)?;
        if ahead == 0 {
            return Ok(());
        }

        log::debug!(
            "Discarding {} local commit(s), resetting {} to {}",
            ahead,
            DEFAULT_BRANCH_NAME,
            upstream_oid
        );
        let target = self.repo.find_object(upstream_oid, None)?;
        self.repo.reset(&target, ResetType::Hard, None)?;
        Ok(())
    }

    /// Fetch `master` from `origin` and fast-forward the local branch.
    /// A diverged local branch is an error; `reset_head_to_upstream` must
    /// run first.
    pub fn pull(&self) -> Result<(), MirrorError> {
        let mut remote = self.repo.find_remote(DEFAULT_ORIGIN_NAME)?;
        // Full refspec so the origin/master tracking ref always advances;
        // the ahead-only reset compares against it on the next run
        let refspec = format!(
            "+refs/heads/{DEFAULT_BRANCH_NAME}:refs/remotes/{DEFAULT_ORIGIN_NAME}/{DEFAULT_BRANCH_NAME}"
        );
        remote.fetch(&[refspec.as_str()], None, None)?;

        let fetch_head = self.repo.find_reference("FETCH_HEAD")?;
        let fetch_commit = self.repo.reference_to_annotated_commit(&fetch_head)?;
        let (analysis, _) = self.repo.merge_analysis(&[&fetch_commit])?;

        if analysis.is_up_to_date() {
            return Ok(());
        }
        if !analysis.is_fast_forward() {
            return Err(MirrorError::cannot_fast_forward(DEFAULT_BRANCH_NAME));
        }

        let refname = format!("refs/heads/{DEFAULT_BRANCH_NAME}");
        let mut reference = self.repo.find_reference(&refname)?;
        reference.set_target(fetch_commit.id(), "fast-forward")?;
        self.repo.set_head(&refname)?;
        self.repo
            .checkout_head(Some(CheckoutBuilder::default().force()))?;
        Ok(())
    }

    /// File-level changes between two commits, rename detection enabled.
    pub fn diff(&self, old: &str, new: &str) -> Result<Vec<IndexChange>, MirrorError> {
        let old_tree = self.commit_tree(old)?;
        let new_tree = self.commit_tree(new)?;

        let mut diff = self
            .repo
            .diff_tree_to_tree(Some(&old_tree), Some(&new_tree), None)?;
        let mut find_opts = DiffFindOptions::new();
        find_opts.renames(true);
        diff.find_similar(Some(&mut find_opts))?;

        let mut changes: Vec<IndexChange> = Vec::new();
        for delta in diff.deltas() {
            let old_path = delta.old_file().path();
            let new_path = delta.new_file().path();
            match delta.status() {
                Delta::Added => {
                    let Some(path) = new_path else { continue };
                    changes.push(IndexChange::added(path));
                }
                Delta::Modified => {
                    let Some(path) = new_path else { continue };
                    changes.push(IndexChange::modified(path));
                }
                Delta::Deleted => {
                    let Some(path) = old_path else { continue };
                    changes.push(IndexChange::deleted(path));
                }
                Delta::Renamed => {
                    let (Some(from), Some(to)) = (old_path, new_path) else {
                        continue;
                    };
                    changes.push(IndexChange::renamed(from, to));
                }
                status => {
                    log::debug!("Ignoring index delta {:?} for {:?}", status, new_path);
                }
            }
        }
        Ok(changes)
    }

    /// Overwrite the repository-root `config.json` and commit it on top of
    /// HEAD. The commit is local-only and gets discarded by the next
    /// `reset_head_to_upstream`.
    pub fn amend_config(&self, config: &IndexConfig) -> Result<(), MirrorError> {
        let config_path = self.path.join(INDEX_CONFIG_FILENAME);
        let contents = serde_json::to_string_pretty(config)?;
        util::fs::write(&config_path, contents)?;

        let mut index = self.repo.index()?;
        index.add_path(Path::new(INDEX_CONFIG_FILENAME))?;
        index.write()?;
        let tree_id = index.write_tree()?;
        let tree = self.repo.find_tree(tree_id)?;

        let signature = self.signature()?;
        let head = self.repo.head()?.peel_to_commit()?;
        self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            CONFIG_COMMIT_MESSAGE,
            &tree,
            &[&head],
        )?;
        log::debug!("Committed config.json overrides: {:?}", config);
        Ok(())
    }

    fn branch_oid(&self, name: &str, branch_type: BranchType) -> Result<Oid, MirrorError> {
        let branch = self
            .repo
            .find_branch(name, branch_type)
            .map_err(|_| MirrorError::branch_not_found(name))?;
        branch
            .get()
            .target()
            .ok_or_else(|| MirrorError::branch_not_found(name))
    }

    fn commit_tree(&self, commit_id: &str) -> Result<git2::Tree<'_>, MirrorError> {
        let oid = Oid::from_str(commit_id)?;
        let commit = self
            .repo
            .find_commit(oid)
            .map_err(|_| MirrorError::commit_not_found(commit_id))?;
        Ok(commit.tree()?)
    }

    fn signature(&self) -> Result<Signature<'static>, MirrorError> {
        match self.repo.signature() {
            Ok(signature) => Ok(signature),
            Err(_) => Ok(Signature::now(
                MIRROR_COMMITTER_NAME,
                MIRROR_COMMITTER_EMAIL,
            )?),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::error::MirrorError;
    use crate::index::IndexRepository;
    use crate::model::{ChangeKind, IndexConfig};
    use crate::test;
    use crate::util;

    #[test]
    fn ensure_cloned_clones_then_opens() -> Result<(), MirrorError> {
        test::run_empty_dir_test(|dir| {
            let clone_dir = dir.join("index");
            let upstream = test::UpstreamFixture::create(dir.join("upstream"))?;
            let first = upstream.commit_file(
                "aa/ho/aho",
                "{\"name\":\"aho\",\"vers\":\"0.1.0\",\"cksum\":\"aa\",\"yanked\":false}",
            )?;

            let index = IndexRepository::ensure_cloned(&upstream.url(), &clone_dir)?;
            assert_eq!(index.current_commit()?, first);

            // Second call must open the existing clone, not re-clone
            let index = IndexRepository::ensure_cloned(&upstream.url(), &clone_dir)?;
            assert_eq!(index.current_commit()?, first);

            Ok(())
        })
    }

    #[test]
    fn pull_fast_forwards_to_upstream() -> Result<(), MirrorError> {
        test::run_empty_dir_test(|dir| {
            let clone_dir = dir.join("index");
            let upstream = test::UpstreamFixture::create(dir.join("upstream"))?;
            upstream.commit_file(
                "aa/ho/aho",
                "{\"name\":\"aho\",\"vers\":\"0.1.0\",\"cksum\":\"aa\",\"yanked\":false}",
            )?;

            let index = IndexRepository::ensure_cloned(&upstream.url(), &clone_dir)?;

            let second = upstream.commit_file(
                "se/rd/serde",
                "{\"name\":\"serde\",\"vers\":\"1.0.0\",\"cksum\":\"cc\",\"yanked\":false}",
            )?;

            index.reset_head_to_upstream()?;
            index.pull()?;
            assert_eq!(index.current_commit()?, second);
            // The working tree advanced too
            assert!(clone_dir.join("se").join("rd").join("serde").exists());

            // Pulling again with no upstream change is a no-op
            index.pull()?;
            assert_eq!(index.current_commit()?, second);

            Ok(())
        })
    }

    #[test]
    fn reset_head_discards_local_amend_commit() -> Result<(), MirrorError> {
        test::run_empty_dir_test(|dir| {
            let clone_dir = dir.join("index");
            let upstream = test::UpstreamFixture::create(dir.join("upstream"))?;
            let first = upstream.commit_file(
                "aa/ho/aho",
                "{\"name\":\"aho\",\"vers\":\"0.1.0\",\"cksum\":\"aa\",\"yanked\":false}",
            )?;

            let index = IndexRepository::ensure_cloned(&upstream.url(), &clone_dir)?;

            let config = IndexConfig {
                dl: "http://localhost/crates".to_string(),
                api: "http://localhost".to_string(),
            };
            index.amend_config(&config)?;
            assert_ne!(index.current_commit()?, first);

            index.reset_head_to_upstream()?;
            assert_eq!(index.current_commit()?, first);

            Ok(())
        })
    }

    #[test]
    fn reset_head_is_noop_when_not_ahead() -> Result<(), MirrorError> {
        test::run_empty_dir_test(|dir| {
            let clone_dir = dir.join("index");
            let upstream = test::UpstreamFixture::create(dir.join("upstream"))?;
            let first = upstream.commit_file(
                "aa/ho/aho",
                "{\"name\":\"aho\",\"vers\":\"0.1.0\",\"cksum\":\"aa\",\"yanked\":false}",
            )?;

            let index = IndexRepository::ensure_cloned(&upstream.url(), &clone_dir)?;

            // Local equals origin/master right after the clone
            index.reset_head_to_upstream()?;
            assert_eq!(index.current_commit()?, first);

            // Upstream advances and the tracking ref learns about it, so the
            // local branch is now strictly behind. The reset direction only
            // fires when local is ahead; a behind branch stays put and the
            // pull fast-forwards it later.
            upstream.commit_file(
                "se/rd/serde",
                "{\"name\":\"serde\",\"vers\":\"1.0.0\",\"cksum\":\"cc\",\"yanked\":false}",
            )?;
            let clone = git2::Repository::open(&clone_dir)?;
            clone.find_remote("origin")?.fetch(
                &["+refs/heads/master:refs/remotes/origin/master"],
                None,
                None,
            )?;

            index.reset_head_to_upstream()?;
            assert_eq!(index.current_commit()?, first);

            Ok(())
        })
    }

    #[test]
    fn diff_classifies_all_change_kinds() -> Result<(), MirrorError> {
        test::run_empty_dir_test(|dir| {
            let upstream = test::UpstreamFixture::create(dir.join("upstream"))?;
            upstream.commit_file(
                "aa/ho/aho",
                "{\"name\":\"aho\",\"vers\":\"0.1.0\",\"cksum\":\"aa\",\"yanked\":false}",
            )?;
            let old = upstream.commit_file(
                "de/le/deleteme",
                "{\"name\":\"deleteme\",\"vers\":\"0.1.0\",\"cksum\":\"dd\",\"yanked\":false}",
            )?;

            // added
            upstream.commit_file(
                "se/rd/serde",
                "{\"name\":\"serde\",\"vers\":\"1.0.0\",\"cksum\":\"cc\",\"yanked\":false}",
            )?;
            // modified
            upstream.commit_file(
                "aa/ho/aho",
                "{\"name\":\"aho\",\"vers\":\"0.1.0\",\"cksum\":\"aa\",\"yanked\":false}\n{\"name\":\"aho\",\"vers\":\"0.2.0\",\"cksum\":\"bb\",\"yanked\":false}",
            )?;
            // deleted
            let new = upstream.delete_file("de/le/deleteme")?;

            let index = IndexRepository::ensure_cloned(&upstream.url(), &dir.join("index"))?;
            let changes = index.diff(&old, &new)?;

            assert_eq!(changes.len(), 3);
            let added = changes
                .iter()
                .find(|c| c.kind == ChangeKind::Added)
                .unwrap();
            assert!(added.path.ends_with("se/rd/serde"));
            let modified = changes
                .iter()
                .find(|c| c.kind == ChangeKind::Modified)
                .unwrap();
            assert!(modified.path.ends_with("aa/ho/aho"));
            let deleted = changes
                .iter()
                .find(|c| c.kind == ChangeKind::Deleted)
                .unwrap();
            assert!(deleted.path.ends_with("de/le/deleteme"));

            Ok(())
        })
    }

    #[test]
    fn diff_detects_renames() -> Result<(), MirrorError> {
        test::run_empty_dir_test(|dir| {
            let upstream = test::UpstreamFixture::create(dir.join("upstream"))?;
            let old = upstream.commit_file(
                "aa/ho/aho",
                "{\"name\":\"aho\",\"vers\":\"0.1.0\",\"cksum\":\"aa\",\"yanked\":false}",
            )?;
            let new = upstream.rename_file("aa/ho/aho", "ah/-o/ah-o")?;

            let index = IndexRepository::ensure_cloned(&upstream.url(), &dir.join("index"))?;
            let changes = index.diff(&old, &new)?;

            assert_eq!(changes.len(), 1);
            assert!(changes[0].path.ends_with("ah/-o/ah-o"));
            match &changes[0].kind {
                ChangeKind::Renamed { from } => assert!(from.ends_with("aa/ho/aho")),
                kind => panic!("expected rename, got {kind:?}"),
            }

            Ok(())
        })
    }

    #[test]
    fn amend_config_writes_and_commits() -> Result<(), MirrorError> {
        test::run_empty_dir_test(|dir| {
            let clone_dir = dir.join("index");
            let upstream = test::UpstreamFixture::create(dir.join("upstream"))?;
            upstream.commit_file(
                "aa/ho/aho",
                "{\"name\":\"aho\",\"vers\":\"0.1.0\",\"cksum\":\"aa\",\"yanked\":false}",
            )?;

            let index = IndexRepository::ensure_cloned(&upstream.url(), &clone_dir)?;
            let config = IndexConfig {
                dl: "http://localhost/crates".to_string(),
                api: "http://localhost".to_string(),
            };
            index.amend_config(&config)?;

            let written = util::fs::read_to_string(clone_dir.join("config.json"))?;
            let parsed: IndexConfig = serde_json::from_str(&written)?;
            assert_eq!(parsed, config);

            // Working tree is clean and the commit carries the fixed message
            let repo = git2::Repository::open(&clone_dir)?;
            let head = repo.head()?.peel_to_commit()?;
            assert_eq!(head.message(), Some("point to local server"));

            Ok(())
        })
    }
}
