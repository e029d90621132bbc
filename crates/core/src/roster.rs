//! Roster validation
//!
//! Decides whether a creator plus a list of invited players forms a legal
//! roster. Never looks at time; conflicts are the checkers' job.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{NotFoundError, Result, ValidationError};
use crate::models::UserId;
use crate::storage::UserDirectory;

/// Match format implied by the roster size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RosterFormat {
    /// Two players
    Singles,
    /// Four players
    Doubles,
}

impl RosterFormat {
    /// Format for a total headcount, creator included
    pub fn from_total(total: usize) -> Option<Self> {
        match total {
            2 => Some(RosterFormat::Singles),
            4 => Some(RosterFormat::Doubles),
            _ => None,
        }
    }
}

/// A validated roster: the creator plus distinct, eligible participants
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    creator: UserId,
    participants: Vec<UserId>,
    format: RosterFormat,
}

impl Roster {
    pub fn creator(&self) -> UserId {
        self.creator
    }

    pub fn participants(&self) -> &[UserId] {
        &self.participants
    }

    pub fn format(&self) -> RosterFormat {
        self.format
    }

    /// Every member, creator first
    pub fn members(&self) -> impl Iterator<Item = UserId> + '_ {
        std::iter::once(self.creator).chain(self.participants.iter().copied())
    }

    /// Players on court, creator included
    pub fn headcount(&self) -> usize {
        self.participants.len() + 1
    }
}

/// Structural checks that need no lookups, in order:
/// id shape, duplicates, creator exclusion, headcount.
pub fn check_roster_shape(
    creator: UserId,
    participants: &[UserId],
) -> std::result::Result<RosterFormat, ValidationError> {
    if let Some(bad) = participants.iter().find(|id| !id.is_well_formed()) {
        return Err(ValidationError::InvalidParticipantId { id: bad.get() });
    }

    let mut seen = HashSet::with_capacity(participants.len());
    for id in participants {
        if !seen.insert(*id) {
            return Err(ValidationError::DuplicateParticipant { user_id: *id });
        }
    }

    if seen.contains(&creator) {
        return Err(ValidationError::CreatorListedAsParticipant { user_id: creator });
    }

    let total = participants.len() + 1;
    RosterFormat::from_total(total).ok_or(ValidationError::InvalidRosterSize { total })
}

/// Validate a roster, resolving every participant through `directory`.
///
/// Each failing rule short-circuits with its own error. Privileged
/// accounts are never valid participants.
pub fn validate_roster<D: UserDirectory + ?Sized>(
    directory: &D,
    creator: UserId,
    participants: &[UserId],
) -> Result<Roster> {
    let format = check_roster_shape(creator, participants)?;

    for id in participants {
        match directory.find_user(*id)? {
            None => {
                return Err(NotFoundError::User {
                    user_id: *id,
                    reason: "no such user",
                }
                .into())
            }
            Some(user) if user.is_admin => {
                return Err(NotFoundError::User {
                    user_id: *id,
                    reason: "privileged accounts cannot be participants",
                }
                .into())
            }
            Some(_) => {}
        }
    }

    Ok(Roster {
        creator,
        participants: participants.to_vec(),
        format,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::Utc;

    use super::*;
    use crate::error::Error;
    use crate::models::User;

    struct Directory(HashMap<UserId, User>);

    impl Directory {
        fn with(users: &[(i64, bool)]) -> Self {
            Self(
                users
                    .iter()
                    .map(|(id, is_admin)| {
                        let user = User {
                            id: UserId(*id),
                            email: format!("user{id}@example.com"),
                            first_name: "Test".into(),
                            last_name: format!("User{id}"),
                            is_admin: *is_admin,
                            created_at: Utc::now(),
                        };
                        (user.id, user)
                    })
                    .collect(),
            )
        }
    }

    impl UserDirectory for Directory {
        fn find_user(&self, id: UserId) -> Result<Option<User>> {
            Ok(self.0.get(&id).cloned())
        }
    }

    fn ids(raw: &[i64]) -> Vec<UserId> {
        raw.iter().copied().map(UserId).collect()
    }

    #[test]
    fn test_singles_and_doubles() {
        let dir = Directory::with(&[(2, false), (3, false), (4, false)]);

        let singles = validate_roster(&dir, UserId(1), &ids(&[2])).unwrap();
        assert_eq!(singles.format(), RosterFormat::Singles);
        assert_eq!(singles.members().collect::<Vec<_>>(), ids(&[1, 2]));

        let doubles = validate_roster(&dir, UserId(1), &ids(&[2, 3, 4])).unwrap();
        assert_eq!(doubles.format(), RosterFormat::Doubles);
        assert_eq!(doubles.headcount(), 4);
    }

    #[test]
    fn test_malformed_id_first() {
        // Also duplicated and wrong size, but the id shape is checked first
        assert_eq!(
            check_roster_shape(UserId(1), &ids(&[0, 0])),
            Err(ValidationError::InvalidParticipantId { id: 0 })
        );
    }

    #[test]
    fn test_duplicates_before_creator_check() {
        assert_eq!(
            check_roster_shape(UserId(1), &ids(&[1, 2, 2])),
            Err(ValidationError::DuplicateParticipant { user_id: UserId(2) })
        );
    }

    #[test]
    fn test_creator_in_list() {
        assert_eq!(
            check_roster_shape(UserId(1), &ids(&[1])),
            Err(ValidationError::CreatorListedAsParticipant { user_id: UserId(1) })
        );
    }

    #[test]
    fn test_invalid_sizes() {
        let cases: [&[i64]; 3] = [&[], &[2, 3], &[2, 3, 4, 5]];
        for raw in cases {
            let total = raw.len() + 1;
            assert_eq!(
                check_roster_shape(UserId(1), &ids(raw)),
                Err(ValidationError::InvalidRosterSize { total })
            );
        }
    }

    #[test]
    fn test_unknown_participant() {
        let dir = Directory::with(&[(2, false)]);
        let err = validate_roster(&dir, UserId(1), &ids(&[2, 3, 9])).unwrap_err();
        assert!(matches!(
            err,
            Error::NotFound(NotFoundError::User { user_id: UserId(3), .. })
        ));
    }

    #[test]
    fn test_admin_cannot_participate() {
        let dir = Directory::with(&[(2, true)]);
        let err = validate_roster(&dir, UserId(1), &ids(&[2])).unwrap_err();
        assert!(matches!(
            err,
            Error::NotFound(NotFoundError::User { user_id: UserId(2), .. })
        ));
    }
}
