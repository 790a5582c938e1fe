//! Paginated search-plan state machine.
//!
//! A multi-step fetch walks the persisted plan one descriptor per call,
//! resuming from an opaque continuation token. When a sub-search comes back
//! sparse, rectification retroactively skip-marks the whole sub-tree below
//! the current entry and advances to the next eligible one.

use crate::error::{PlaceCoverError, Result};
use crate::plan::{self, PlanEntry};
use crate::store::PlanStore;
use serde::Serialize;
use std::fmt;

const TOKEN_PREFIX: &str = "page_token=";
const TOKEN_DELIMITER: &str = "@#$";

/// Continuation token: plan name plus a zero-based index into the plan list.
///
/// Wire format: `page_token={plan_name}@#${index}`. The exhausted state is
/// represented by the empty string, not by a token value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageToken {
    pub plan_name: String,
    pub index: usize,
}

impl PageToken {
    pub fn new(plan_name: impl Into<String>, index: usize) -> Self {
        Self {
            plan_name: plan_name.into(),
            index,
        }
    }

    /// Parse a continuation token.
    ///
    /// A missing prefix or delimiter, an empty plan name, or a non-numeric
    /// index fails with `InvalidToken`; the caller treats that as fatal.
    ///
    /// # Examples
    ///
    /// ```
    /// use placecover::pagination::PageToken;
    ///
    /// let token = PageToken::parse("page_token=plan_parking_Saudi Arabia_Jeddah@#$3").unwrap();
    /// assert_eq!(token.plan_name, "plan_parking_Saudi Arabia_Jeddah");
    /// assert_eq!(token.index, 3);
    ///
    /// assert!(PageToken::parse("plan_a@#$3").is_err());
    /// assert!(PageToken::parse("page_token=plan_a@#$x").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = || PlaceCoverError::InvalidToken(raw.to_string());

        let rest = raw.strip_prefix(TOKEN_PREFIX).ok_or_else(invalid)?;
        let (plan_name, index_part) = rest.split_once(TOKEN_DELIMITER).ok_or_else(invalid)?;

        if plan_name.is_empty() {
            return Err(invalid());
        }
        let index: usize = index_part.parse().map_err(|_| invalid())?;

        Ok(Self {
            plan_name: plan_name.to_string(),
            index,
        })
    }

    pub fn encode(&self) -> String {
        format!(
            "{}{}{}{}",
            TOKEN_PREFIX, self.plan_name, TOKEN_DELIMITER, self.index
        )
    }
}

impl fmt::Display for PageToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encode())
    }
}

/// Encode an optional token at the wire boundary; exhausted is `""`.
pub fn encode_token(token: &Option<PageToken>) -> String {
    token.as_ref().map(PageToken::encode).unwrap_or_default()
}

/// The resolved state of one pagination step: the entry to search now and
/// the token for the step after it.
///
/// The raw entry is kept as persisted. Geometry-driven callers parse it
/// with [`PlanCursor::entry`]; record-oriented plans carry opaque entries
/// that double as dataset keys and are never parsed.
#[derive(Debug, Clone)]
pub struct PlanCursor {
    pub plan_name: String,
    pub index: usize,
    /// The current plan entry, exactly as persisted.
    pub raw: String,
    /// `None` once the plan is exhausted.
    pub next_token: Option<PageToken>,
}

impl PlanCursor {
    /// Parse the current entry as a search descriptor.
    pub fn entry(&self) -> Result<PlanEntry> {
        PlanEntry::parse(&self.raw)
    }
}

/// Begin a multi-step fetch: append the sentinel, persist the plan, and
/// resolve the first step.
///
/// The returned cursor points at entry 0 and mints a token at index 1, or
/// the exhausted token for a single-entry plan.
pub fn start_plan<S: PlanStore>(
    store: &mut S,
    plan_name: &str,
    mut entries: Vec<String>,
) -> Result<PlanCursor> {
    if entries.is_empty() {
        return Err(PlaceCoverError::InvalidInput(
            "Cannot start an empty search plan".to_string(),
        ));
    }

    entries.push(plan::PLAN_SENTINEL.to_string());
    store.save_plan(plan_name, &entries)?;
    log::info!(
        "started search plan {:?} with {} entries",
        plan_name,
        entries.len() - 1
    );

    let next_token = if plan::is_sentinel(&entries[1]) {
        None
    } else {
        Some(PageToken::new(plan_name, 1))
    };

    Ok(PlanCursor {
        plan_name: plan_name.to_string(),
        index: 0,
        raw: entries[0].clone(),
        next_token,
    })
}

/// Resume a multi-step fetch from a continuation token.
///
/// Loads the persisted plan, seeds the current search from `plan[index]`,
/// and mints the next token at `index + 1`, or none when the entry after the
/// current one is the sentinel.
///
/// Skip marks are deliberately ignored here: plain advancement is one step
/// at a time, and only rectification scans past skipped entries.
pub fn resume_plan<S: PlanStore>(store: &S, token: &PageToken) -> Result<PlanCursor> {
    let entries = store.get_plan(&token.plan_name)?;

    let raw = entries.get(token.index).ok_or_else(|| {
        PlaceCoverError::InvalidToken(format!(
            "Token index {} out of bounds for plan {:?} of length {}",
            token.index,
            token.plan_name,
            entries.len()
        ))
    })?;
    if plan::is_sentinel(raw) {
        return Err(PlaceCoverError::InvalidToken(format!(
            "Token index {} points at the plan sentinel",
            token.index
        )));
    }

    let next_token = match entries.get(token.index + 1) {
        Some(next) if !plan::is_sentinel(next) => {
            Some(PageToken::new(token.plan_name.clone(), token.index + 1))
        }
        _ => None,
    };

    Ok(PlanCursor {
        plan_name: token.plan_name.clone(),
        index: token.index,
        raw: raw.clone(),
        next_token,
    })
}

/// Rectify a plan after a sparse sub-search.
///
/// Skip-marks every entry whose position is a strict descendant of the
/// current entry's position, persists the rectified plan, and returns the
/// index of the next entry that is neither sentinel nor skip-marked, or
/// `None` when the plan is exhausted. Idempotent.
pub fn rectify_plan<S: PlanStore>(
    store: &mut S,
    plan_name: &str,
    current_index: usize,
) -> Result<Option<usize>> {
    let entries = store.get_plan(plan_name)?;

    let current_raw = entries.get(current_index).ok_or_else(|| {
        PlaceCoverError::InvalidInput(format!(
            "Rectify index {} out of bounds for plan {:?} of length {}",
            current_index,
            plan_name,
            entries.len()
        ))
    })?;
    let current = PlanEntry::parse(current_raw)?;

    let mut marked = 0usize;
    let mut rectified = Vec::with_capacity(entries.len());
    // The sentinel is carried over untouched; everything before it is a
    // descriptor.
    let last = entries.len() - 1;
    for (i, raw) in entries.iter().enumerate() {
        if i == last {
            rectified.push(raw.clone());
            continue;
        }
        let entry = PlanEntry::parse(raw)?;
        if entry.position.is_descendant_of(&current.position) && !plan::is_skipped(raw) {
            rectified.push(plan::mark_skip(raw));
            marked += 1;
        } else {
            rectified.push(raw.clone());
        }
    }

    store.save_plan(plan_name, &rectified)?;

    let next = rectified
        .iter()
        .enumerate()
        .skip(current_index + 1)
        .find(|(_, raw)| !plan::is_skipped(raw) && !plan::is_sentinel(raw))
        .map(|(i, _)| i);

    match next {
        Some(i) => log::info!(
            "rectified plan {:?} at entry {} ({}): marked {} descendants, next entry {}",
            plan_name,
            current_index,
            current.position,
            marked,
            i
        ),
        None => log::info!(
            "rectified plan {:?} at entry {} ({}): marked {} descendants, plan exhausted",
            plan_name,
            current_index,
            current.position,
            marked
        ),
    }

    Ok(next)
}
