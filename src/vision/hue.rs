//! Hue arithmetic on the color circle.

/// Known hue families of the game, for log output.
const KNOWN_FAMILIES: [(i32, &str); 4] = [(77, "green"), (206, "blue"), (169, "cyan"), (33, "orange")];

/// Circular distance between two hues, in `[0, 180]`.
pub fn hue_distance(a: i32, b: i32) -> i32 {
    let d = (a - b).rem_euclid(360);
    d.min(360 - d)
}

/// Circular mean of a set of hues, rounded to whole degrees.
///
/// Returns `None` for an empty set.
pub fn circular_mean(hues: &[i32]) -> Option<i32> {
    if hues.is_empty() {
        return None;
    }
    let (sin, cos) = hues.iter().fold((0.0f64, 0.0f64), |(s, c), &h| {
        let rad = (h as f64).to_radians();
        (s + rad.sin(), c + rad.cos())
    });
    let mean = sin.atan2(cos).to_degrees().round() as i32;
    Some(mean.rem_euclid(360))
}

/// Groups hues into families.
///
/// A hue joins the first family whose circular mean is closer than
/// `tolerance`, otherwise it starts a new family. Families whose means end
/// up closer than `tolerance` are merged afterwards, so the resulting family
/// means are pairwise at least `tolerance` apart. Families keep the order in
/// which they were first seen.
pub fn cluster_hues(hues: &[i32], tolerance: i32) -> Vec<Vec<i32>> {
    let mut clusters: Vec<Vec<i32>> = Vec::new();

    for &hue in hues {
        let home = clusters.iter().position(|members| {
            circular_mean(members).is_some_and(|mean| hue_distance(mean, hue) < tolerance)
        });
        match home {
            Some(idx) => clusters[idx].push(hue),
            None => clusters.push(vec![hue]),
        }
    }

    while let Some((i, j)) = find_close_pair(&clusters, tolerance) {
        let absorbed = clusters.remove(j);
        clusters[i].extend(absorbed);
    }

    clusters
}

fn find_close_pair(clusters: &[Vec<i32>], tolerance: i32) -> Option<(usize, usize)> {
    let means: Vec<Option<i32>> = clusters.iter().map(|c| circular_mean(c)).collect();
    for i in 0..means.len() {
        for j in (i + 1)..means.len() {
            if let (Some(a), Some(b)) = (means[i], means[j]) {
                if hue_distance(a, b) < tolerance {
                    return Some((i, j));
                }
            }
        }
    }
    None
}

/// Returns the representative hue of every family present in `hues`.
pub fn distinguish_hues(hues: &[i32], tolerance: i32) -> Vec<i32> {
    cluster_hues(hues, tolerance)
        .iter()
        .filter_map(|members| circular_mean(members))
        .collect()
}

/// Name of the known family within `tolerance` of `hue`, if any.
pub fn hue_family_name(hue: i32, tolerance: i32) -> Option<&'static str> {
    KNOWN_FAMILIES
        .iter()
        .map(|&(family, name)| (hue_distance(hue, family), name))
        .filter(|&(d, _)| d <= tolerance)
        .min_by_key(|&(d, _)| d)
        .map(|(_, name)| name)
}
