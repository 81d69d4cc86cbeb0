//! Built-in category tables for the Generation-Free tracker.
//!
//! The two directions are maintained separately: searches for a Torznab
//! subcategory (e.g. 2030 Movies/HD) narrow the upstream filter, while
//! upstream results are always reported under the parent Torznab category.

/// Upstream category id -> Torznab category ids.
pub(super) const FORWARD: &[(u32, &[u32])] = &[
    // Films, Films HD, Films 4K, Animation
    (1, &[2000]),
    (16, &[2000]),
    (17, &[2000]),
    (7, &[2000]),
    // Series, Series HD
    (2, &[5000]),
    (18, &[5000]),
    // FLAC, MP3
    (3, &[3000]),
    (4, &[3000]),
    // Software
    (5, &[4000]),
    // E-books
    (6, &[7000]),
];

/// Torznab category id -> upstream category ids.
pub(super) const REVERSE: &[(u32, &[u32])] = &[
    (2000, &[1, 16, 17, 7]),
    (2010, &[1]),
    (2020, &[1]),
    (2030, &[17]),
    (2040, &[17]),
    (2045, &[17]),
    (5000, &[2, 18]),
    (5020, &[2]),
    (5030, &[18]),
    (5040, &[18]),
    (3000, &[3, 4]),
    (4000, &[5]),
    (7000, &[6]),
];
