//! The fixed table of known record collections.
//!
//! Commit events are classified by exact NSID match. Anything outside the
//! table lands in [`Collection::Other`] and is passed through verbatim.

use crate::sink::ReportLabel;

/// A commit's collection, resolved against the known table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Collection {
    Post,
    Like,
    Repost,
    Follow,
    Block,
    Threadgate,
    Profile,
    FeedGenerator,
    /// Unrecognized NSID, kept literally.
    Other(String),
}

/// NSID → variant. Order is irrelevant; lookups are exact.
const KNOWN: &[(&str, Collection)] = &[
    ("app.bsky.feed.post", Collection::Post),
    ("app.bsky.feed.like", Collection::Like),
    ("app.bsky.feed.repost", Collection::Repost),
    ("app.bsky.graph.follow", Collection::Follow),
    ("app.bsky.graph.block", Collection::Block),
    ("app.bsky.feed.threadgate", Collection::Threadgate),
    ("app.bsky.actor.profile", Collection::Profile),
    ("app.bsky.feed.generator", Collection::FeedGenerator),
];

impl Collection {
    /// Resolve an NSID against the known table.
    pub fn from_nsid(nsid: &str) -> Self {
        KNOWN
            .iter()
            .find(|(known, _)| *known == nsid)
            .map(|(_, c)| c.clone())
            .unwrap_or_else(|| Self::Other(nsid.to_string()))
    }

    /// The NSID this collection was resolved from.
    pub fn nsid(&self) -> &str {
        match self {
            Self::Other(nsid) => nsid.as_str(),
            known => KNOWN
                .iter()
                .find(|(_, c)| c == known)
                .map(|(nsid, _)| *nsid)
                .unwrap_or_default(),
        }
    }

    /// Collections whose record references another record via `subject`.
    pub fn is_subject_bearing(&self) -> bool {
        matches!(self, Self::Like | Self::Repost | Self::Follow | Self::Block)
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }

    /// Label used when reporting a commit of this collection.
    pub fn label(&self) -> ReportLabel {
        match self {
            Self::Post => ReportLabel::Post,
            Self::Like => ReportLabel::Like,
            Self::Repost => ReportLabel::Repost,
            Self::Follow => ReportLabel::Follow,
            Self::Block => ReportLabel::Block,
            Self::Threadgate => ReportLabel::Threadgate,
            Self::Profile => ReportLabel::Profile,
            Self::FeedGenerator => ReportLabel::FeedGenerator,
            Self::Other(_) => ReportLabel::Other,
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.nsid())
    }
}
