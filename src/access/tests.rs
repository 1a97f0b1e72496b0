use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};

struct CountingGrant {
    root: PathBuf,
    allow: bool,
    begins: AtomicUsize,
    ends: AtomicUsize,
}

impl CountingGrant {
    fn new(root: &str, allow: bool) -> Arc<Self> {
        Arc::new(Self {
            root: PathBuf::from(root),
            allow,
            begins: AtomicUsize::new(0),
            ends: AtomicUsize::new(0),
        })
    }
}

impl FolderAccessGrant for CountingGrant {
    fn root(&self) -> &Path {
        &self.root
    }

    fn begin_use(&self) -> bool {
        self.begins.fetch_add(1, Ordering::SeqCst);
        self.allow
    }

    fn end_use(&self) {
        self.ends.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn grant_is_released_only_after_last_holder() {
    let registry = GrantRegistry::new();
    let grant = CountingGrant::new("/music", true);
    registry.register(grant.clone());

    let scan = registry.acquire(Path::new("/music/a")).unwrap();
    let lyric = registry.acquire(Path::new("/music/a/b.lrc")).unwrap();
    assert_eq!(grant.begins.load(Ordering::SeqCst), 1);
    assert_eq!(registry.holders(Path::new("/music")), 2);

    drop(scan);
    assert_eq!(grant.ends.load(Ordering::SeqCst), 0);

    drop(lyric);
    assert_eq!(grant.ends.load(Ordering::SeqCst), 1);
    assert_eq!(registry.holders(Path::new("/music")), 0);
}

#[test]
fn paths_outside_any_grant_are_rejected() {
    let registry = GrantRegistry::new();
    registry.register(CountingGrant::new("/music", true));

    let err = registry.acquire(Path::new("/elsewhere/x.mp3")).err().unwrap();
    assert!(matches!(err, AccessError::NoGrant(_)));
    // Prefix strings that are not path ancestors do not match.
    assert!(registry.acquire(Path::new("/musical/x.mp3")).is_err());
}

#[test]
fn refused_grant_reports_denied_and_holds_nothing() {
    let registry = GrantRegistry::new();
    let grant = CountingGrant::new("/locked", false);
    registry.register(grant.clone());

    let err = registry.acquire(Path::new("/locked/a")).err().unwrap();
    assert!(matches!(err, AccessError::Denied(_)));
    assert_eq!(registry.holders(Path::new("/locked")), 0);
    assert_eq!(grant.ends.load(Ordering::SeqCst), 0);
}

#[test]
fn nested_grants_prefer_deepest_root() {
    let registry = GrantRegistry::new();
    registry.register(CountingGrant::new("/music", true));
    registry.register(CountingGrant::new("/music/live", true));

    let guard = registry.acquire(Path::new("/music/live/set.flac")).unwrap();
    assert_eq!(guard.root(), Path::new("/music/live"));
}

#[test]
fn removing_a_held_grant_waits_for_release() {
    let registry = GrantRegistry::new();
    let grant = CountingGrant::new("/music", true);
    registry.register(grant.clone());

    let guard = registry.acquire(Path::new("/music/a")).unwrap();
    registry.remove(Path::new("/music"));
    assert!(registry.roots().is_empty());
    assert!(registry.acquire(Path::new("/music/b")).is_err());

    drop(guard);
    assert_eq!(grant.ends.load(Ordering::SeqCst), 1);
    assert_eq!(registry.holders(Path::new("/music")), 0);
}

#[test]
fn guard_is_released_on_early_return() {
    fn touch(registry: &Arc<GrantRegistry>, fail: bool) -> Result<(), AccessError> {
        let _guard = registry.acquire(Path::new("/music/x"))?;
        if fail {
            return Err(AccessError::Denied(PathBuf::from("/music/x")));
        }
        Ok(())
    }

    let registry = GrantRegistry::new();
    let grant = CountingGrant::new("/music", true);
    registry.register(grant.clone());

    assert!(touch(&registry, true).is_err());
    assert!(touch(&registry, false).is_ok());
    assert_eq!(grant.begins.load(Ordering::SeqCst), 2);
    assert_eq!(grant.ends.load(Ordering::SeqCst), 2);
}

#[test]
fn plain_grant_requires_existing_directory() {
    let dir = tempfile::tempdir().unwrap();
    assert!(PlainFolderGrant::new(dir.path()).begin_use());
    assert!(!PlainFolderGrant::new(dir.path().join("missing")).begin_use());
}
