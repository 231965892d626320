//! Remote reference records and the deterministic selection policy.
//!
//! Given the set of references advertised by a remote and a user-supplied
//! ref string, [`pick_ref`] selects exactly one reference:
//!
//! - an empty ref or `HEAD` selects the symbolic `HEAD`;
//! - a ref that parses as a (possibly incomplete) semver constrains tags:
//!   `v2` matches the latest `2.x.y` tag, `v2.1` the latest `2.1.y` tag,
//!   `v2.1.3` exactly `2.1.3`;
//! - anything else must match an advertised short name exactly.
//!
//! Selection is a pure function of its inputs: no randomness, no time
//! dependence, no iteration-order dependence beyond the explicit
//! descending-version sort.

use node_semver::Version;

use crate::error::{Result, VcsError};

pub(crate) const HEAD: &str = "HEAD";

/// The kind of an advertised reference retained for selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Branch,
    Tag,
    /// The symbolic `HEAD` of the default branch.
    Head,
}

/// One reference advertised by the remote.
///
/// Records are transient: they are only valid for the duration of one
/// retrieval against the advertising remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRef {
    /// Full ref name, e.g. `refs/tags/v1.2.3`.
    pub name: String,
    /// Name with the `refs/{heads,tags}/` prefix removed.
    pub short_name: String,
    pub kind: RefKind,
    /// Hex hash of the commit the ref points at. For annotated tags this is
    /// the peeled target when the remote advertised one.
    pub hash: String,
    /// Tags only: the tag name parsed as a tolerant semver.
    pub semver: Option<Version>,
}

impl RemoteRef {
    /// Builds a record from an advertised ref name, keeping only branches,
    /// tags and the symbolic `HEAD`.
    pub(crate) fn from_advertised(name: &str, hash: String) -> Option<Self> {
        let (kind, short_name) = if name == HEAD {
            (RefKind::Head, HEAD)
        } else if let Some(short) = name.strip_prefix("refs/heads/") {
            (RefKind::Branch, short)
        } else if let Some(short) = name.strip_prefix("refs/tags/") {
            (RefKind::Tag, short)
        } else {
            // notes, pull heads, and other namespaces are never eligible
            return None;
        };

        let semver = if kind == RefKind::Tag {
            parse_tolerant(short_name)
        } else {
            None
        };

        Some(Self {
            name: name.to_owned(),
            short_name: short_name.to_owned(),
            kind,
            hash,
            semver,
        })
    }
}

/// Policy knobs for [`pick_ref`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefPolicy {
    /// Match tags by exact name only; no semver completion, no pre-release
    /// filtering.
    pub exact_tag: bool,
    /// Include pre-release tags in semver resolution. Implied when the ref
    /// spec itself carries a pre-release suffix.
    pub allow_prereleases: bool,
}

/// Parses a version string with tolerance for incomplete specifications: an
/// optional `v` prefix, and missing minor/patch components completed with
/// zeroes (`v2` parses as `2.0.0`). Pre-release and build suffixes are kept.
pub(crate) fn parse_tolerant(input: &str) -> Option<Version> {
    let input = input.trim();
    let input = input.strip_prefix(['v', 'V']).unwrap_or(input);
    if input.is_empty() {
        return None;
    }

    let (core, suffix) = match input.find(['-', '+']) {
        Some(at) => (&input[..at], &input[at..]),
        None => (input, ""),
    };

    let mut numbers = Vec::with_capacity(3);
    for part in core.split('.') {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        numbers.push(part);
    }
    if numbers.len() > 3 {
        return None;
    }
    while numbers.len() < 3 {
        numbers.push("0");
    }

    format!("{}.{}.{}{suffix}", numbers[0], numbers[1], numbers[2])
        .parse()
        .ok()
}

/// Derives the half-open (excluded) upper bound for a version constraint:
/// the pre-release and build parts are zeroed and the component just below
/// the specification level is incremented. `v2` (level 1) bounds at `3.0.0`,
/// `v2.1` (level 2) at `2.2.0`, `v2.1.3` (level 3) at `2.1.4`.
fn upper_bound(version: &Version, level: usize) -> Version {
    match level {
        3 => format!("{}.{}.{}", version.major, version.minor, version.patch + 1),
        2 => format!("{}.{}.0", version.major, version.minor + 1),
        _ => format!("{}.0.0", version.major + 1),
    }
    .parse()
    .expect("version failed to parse")
}

/// Selects exactly one reference out of an advertised set.
///
/// See the module documentation for the selection policy.
pub fn pick_ref(advertised: &[RemoteRef], reference: &str, policy: &RefPolicy) -> Result<RemoteRef> {
    // an empty ref spec addresses the head of the default branch
    let want = if reference.is_empty() { HEAD } else { reference };

    // incomplete version specifications are completed, e.g. "v2" becomes
    // "2.0.0", and constrain the selection up to the next major
    let desired = parse_tolerant(want);
    let is_semver = desired.is_some();

    let mut allow_prereleases = policy.allow_prereleases;
    let mut bound = None;
    if let Some(version) = &desired {
        let level = want.matches('.').count().min(2) + 1;
        bound = Some(upper_bound(version, level));
        // a pre-release in the ref spec implies that pre-releases are accepted
        allow_prereleases = allow_prereleases || !version.pre_release.is_empty();
    }

    let mut survivors: Vec<&RemoteRef> = Vec::new();
    for record in advertised {
        if !retained(
            record,
            want,
            is_semver,
            policy.exact_tag,
            allow_prereleases,
            bound.as_ref(),
        ) {
            continue;
        }

        if want == HEAD || policy.exact_tag {
            // first exact survivor wins
            return Ok(record.clone());
        }
        survivors.push(record);
    }

    if survivors.is_empty() {
        return Err(VcsError::RefNotFound(reference.to_owned()));
    }
    if survivors.len() == 1 {
        return Ok(survivors[0].clone());
    }
    if !is_semver {
        // this can happen because of semver tolerance, e.g. a remote may
        // advertise both tags "v0.2.0" and "0.2.0"
        return Err(VcsError::AmbiguousRef(reference.to_owned()));
    }

    latest_semver(survivors, reference)
}

fn latest_semver(survivors: Vec<&RemoteRef>, reference: &str) -> Result<RemoteRef> {
    let mut eligible: Vec<&RemoteRef> = survivors
        .into_iter()
        .filter(|r| r.semver.is_some())
        .collect();
    if eligible.is_empty() {
        return Err(VcsError::RefNotFound(reference.to_owned()));
    }

    // latest comes first
    eligible.sort_by(|a, b| b.semver.cmp(&a.semver));

    Ok(eligible[0].clone())
}

fn retained(
    record: &RemoteRef,
    want: &str,
    is_semver: bool,
    exact_tag: bool,
    allow_prereleases: bool,
    bound: Option<&Version>,
) -> bool {
    if want == HEAD && record.kind != RefKind::Head {
        // resolving the default branch: only the symbolic HEAD qualifies
        return false;
    }

    if is_semver && record.kind != RefKind::Tag {
        // ignore branch names that could parse as versions
        return false;
    }

    if (exact_tag || !is_semver) && record.short_name != want {
        return false;
    }

    if !exact_tag && is_semver {
        let Some(version) = &record.semver else {
            return false;
        };
        if !allow_prereleases && !version.pre_release.is_empty() {
            return false;
        }
        if let Some(bound) = bound {
            if version >= bound {
                return false;
            }
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tag(name: &str) -> RemoteRef {
        RemoteRef::from_advertised(&format!("refs/tags/{name}"), hash_for(name)).unwrap()
    }

    fn branch(name: &str) -> RemoteRef {
        RemoteRef::from_advertised(&format!("refs/heads/{name}"), hash_for(name)).unwrap()
    }

    fn head() -> RemoteRef {
        RemoteRef::from_advertised(HEAD, hash_for(HEAD)).unwrap()
    }

    fn hash_for(name: &str) -> String {
        // stable dummy hash, unique per name
        format!("{:040x}", name.bytes().map(u64::from).sum::<u64>())
    }

    fn advertised() -> Vec<RemoteRef> {
        vec![
            head(),
            branch("master"),
            branch("feature/v9"),
            tag("v1.0.0"),
            tag("v1.2.0"),
            tag("v1.2.1"),
            tag("v1.3.0-rc1"),
            tag("v2.0.0"),
        ]
    }

    fn resolve(reference: &str, policy: &RefPolicy) -> Result<RemoteRef> {
        pick_ref(&advertised(), reference, policy)
    }

    #[test]
    fn tolerant_parse_completes_versions() {
        assert_eq!(parse_tolerant("v2").unwrap().to_string(), "2.0.0");
        assert_eq!(parse_tolerant("2.1").unwrap().to_string(), "2.1.0");
        assert_eq!(parse_tolerant("v2.1.3").unwrap().to_string(), "2.1.3");
        assert_eq!(
            parse_tolerant("v2.0.0-rc1+build5").unwrap().to_string(),
            "2.0.0-rc1+build5"
        );
        assert!(parse_tolerant("master").is_none());
        assert!(parse_tolerant("HEAD").is_none());
        assert!(parse_tolerant("v1.x").is_none());
        assert!(parse_tolerant("1.2.3.4").is_none());
        assert!(parse_tolerant("").is_none());
    }

    #[test]
    fn empty_and_head_resolve_to_symbolic_head() {
        for reference in ["", "HEAD"] {
            let picked = resolve(reference, &RefPolicy::default()).unwrap();
            assert_eq!(picked.kind, RefKind::Head);
        }
    }

    #[test]
    fn branch_resolves_by_exact_name() {
        let picked = resolve("master", &RefPolicy::default()).unwrap();
        assert_eq!(picked.kind, RefKind::Branch);
        assert_eq!(picked.short_name, "master");
    }

    #[test]
    fn major_constraint_picks_latest_minor() {
        let picked = resolve("v1", &RefPolicy::default()).unwrap();
        assert_eq!(picked.short_name, "v1.2.1");
    }

    #[test]
    fn minor_constraint_picks_latest_patch() {
        let picked = resolve("v1.2", &RefPolicy::default()).unwrap();
        assert_eq!(picked.short_name, "v1.2.1");
    }

    #[test]
    fn full_version_resolves_exactly() {
        let picked = resolve("v1.2.0", &RefPolicy::default()).unwrap();
        assert_eq!(picked.short_name, "v1.2.0");
    }

    #[test]
    fn prereleases_are_excluded_by_default() {
        let refs = vec![tag("v2.0.0"), tag("v2.0.0-rc1")];
        let picked = pick_ref(&refs, "v2", &RefPolicy::default()).unwrap();
        assert_eq!(picked.short_name, "v2.0.0");
    }

    #[test]
    fn prereleases_can_be_allowed() {
        let policy = RefPolicy {
            allow_prereleases: true,
            ..Default::default()
        };
        let refs = vec![tag("v2.0.0-rc1")];
        let picked = pick_ref(&refs, "v2", &policy).unwrap();
        assert_eq!(picked.short_name, "v2.0.0-rc1");

        // with the full advertised set, v1.3.0-rc1 sits below the v2 bound
        // and wins over v1.2.1
        let picked = resolve("v1", &policy).unwrap();
        assert_eq!(picked.short_name, "v1.3.0-rc1");
    }

    #[test]
    fn prerelease_ref_spec_implies_prereleases() {
        let refs = vec![tag("v1.3.0-rc1"), tag("v1.2.1")];
        let picked = pick_ref(&refs, "v1.3.0-rc1", &RefPolicy::default()).unwrap();
        assert_eq!(picked.short_name, "v1.3.0-rc1");
    }

    #[test]
    fn upper_bound_excludes_next_major() {
        // v2.0.0 is >= the derived bound for "v1", so it never matches
        let picked = resolve("v1", &RefPolicy::default()).unwrap();
        assert_ne!(picked.short_name, "v2.0.0");
    }

    #[test]
    fn semver_ignores_branches_with_version_names() {
        let refs = vec![branch("v9"), tag("v9.1.0")];
        let picked = pick_ref(&refs, "v9", &RefPolicy::default()).unwrap();
        assert_eq!(picked.kind, RefKind::Tag);
        assert_eq!(picked.short_name, "v9.1.0");
    }

    #[test]
    fn exact_tag_matches_by_name_only() {
        let policy = RefPolicy {
            exact_tag: true,
            ..Default::default()
        };

        let picked = resolve("v1.2.1", &policy).unwrap();
        assert_eq!(picked.short_name, "v1.2.1");

        // no semver completion under exact matching
        let err = resolve("v1", &policy).unwrap_err();
        assert!(matches!(err, VcsError::RefNotFound(_)));
    }

    #[test]
    fn selection_is_idempotent_under_exact_matching() {
        let exact = RefPolicy {
            exact_tag: true,
            ..Default::default()
        };
        let picked = resolve("v1", &RefPolicy::default()).unwrap();
        let again = resolve(&picked.short_name, &exact).unwrap();
        assert_eq!(picked, again);
    }

    #[test]
    fn ambiguous_short_names_are_rejected() {
        // a branch and a tag sharing the same name cannot be ordered
        let refs = vec![branch("release"), tag("release")];
        let err = pick_ref(&refs, "release", &RefPolicy::default()).unwrap_err();
        assert!(matches!(err, VcsError::AmbiguousRef(_)));
    }

    #[test]
    fn equivalent_version_tags_resolve_to_the_latest() {
        // semver tolerance may retain several spellings of the same version
        let refs = vec![tag("v0.2.0"), tag("0.2.0"), tag("v0.1.0")];
        let picked = pick_ref(&refs, "v0.2", &RefPolicy::default()).unwrap();
        assert_eq!(picked.semver.as_ref().unwrap().to_string(), "0.2.0");
    }

    #[test]
    fn unmatched_refs_are_not_found() {
        let err = resolve("does-not-exist", &RefPolicy::default()).unwrap_err();
        assert!(matches!(err, VcsError::RefNotFound(_)));

        let err = resolve("v42", &RefPolicy::default()).unwrap_err();
        assert!(matches!(err, VcsError::RefNotFound(_)));
    }

    #[test]
    fn foreign_namespaces_are_ignored() {
        assert!(RemoteRef::from_advertised("refs/notes/commits", hash_for("n")).is_none());
        assert!(RemoteRef::from_advertised("refs/pull/42/head", hash_for("p")).is_none());
    }
}
