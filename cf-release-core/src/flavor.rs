//! Game-flavor mapping: interface numbers and filename suffixes.
//!
//! An "interface number" packs a dotted game version into the five-digit
//! form the packager ecosystem uses: `major*10000 + minor*100 + patch`
//! (e.g. `1.15.6` → `11506`, `11.0.2` → `110002`). The leading digits of
//! that number determine which game flavor an artifact was built for.

use crate::contract::GameVersionRef;

/// Parse a dotted `major.minor[.patch]` game version into its interface
/// number. Returns `None` when the string does not carry at least
/// `major.minor` numeric parts.
pub fn interface_number(version: &str) -> Option<u32> {
    let mut parts = version.split('.');
    let major: u32 = parts.next()?.trim().parse().ok()?;
    let minor: u32 = parts.next()?.trim().parse().ok()?;
    let patch: u32 = match parts.next() {
        Some(p) => p.trim().parse().ok()?,
        None => 0,
    };
    Some(major * 10000 + minor * 100 + patch)
}

/// Map an interface number to its game-flavor slug.
pub fn flavor_slug(interface: u32) -> &'static str {
    match interface {
        11000..=11999 => "classic",
        20000..=20999 => "bcc",
        30000..=30999 => "wrath",
        40000..=40999 => "cata",
        _ => "retail",
    }
}

/// Pick the filename suffix slug for an artifact covering the given game
/// versions.
///
/// `None` means no suffix: either the artifact supports retail (the
/// mainline build carries a bare name), or it lists no versions at all.
/// A single non-retail flavor names the artifact; for mixed non-retail
/// sets the highest interface wins.
pub fn pick_slug(game_versions: &[GameVersionRef]) -> Option<&'static str> {
    let interfaces: Vec<u32> = game_versions
        .iter()
        .filter_map(|gv| interface_number(&gv.name))
        .collect();
    if interfaces.is_empty() {
        return None;
    }

    let mut slugs: Vec<&'static str> = interfaces.iter().map(|iv| flavor_slug(*iv)).collect();
    slugs.sort_unstable();
    slugs.dedup();

    if slugs.contains(&"retail") {
        return None;
    }
    if slugs.len() == 1 {
        return Some(slugs[0]);
    }
    // interfaces is non-empty, so max always exists
    let highest = interfaces.iter().max().copied().unwrap_or_default();
    Some(flavor_slug(highest))
}

/// Local filename for a remote artifact: strip the trailing `.zip`, append
/// `-{slug}` unless the base already ends with it, re-append `.zip`.
pub fn suffixed_file_name(remote_name: &str, slug: Option<&str>) -> String {
    let base = remote_name
        .strip_suffix(".zip")
        .unwrap_or(remote_name)
        .to_string();
    let base = match slug {
        Some(slug) if !base.ends_with(&format!("-{slug}")) => format!("{base}-{slug}"),
        _ => base,
    };
    format!("{base}.zip")
}
