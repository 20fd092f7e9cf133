// CurseForge version slugs: `1.20.1` lives under the `minecraft-1-20` type
// with the child slug `1-20-1`. Anything after a `-` is ignored.

/// Slug of the version type a release belongs to, `None` without a minor part.
pub fn version_header_slug(version: &str) -> Option<String> {
    let (release, _) = version.split_once('-').unwrap_or((version, ""));
    let (major, rest) = release.split_once('.')?;
    let minor = rest.split('.').next().unwrap_or(rest);
    Some(format!("minecraft-{major}-{minor}"))
}

pub fn version_slug(version: &str) -> String {
    let (release, _) = version.split_once('-').unwrap_or((version, ""));
    release.replace('.', "-")
}
