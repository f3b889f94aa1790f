//! Enums mapping to SMALLSERIAL/SMALLINT lookup tables.
//!
//! Each enum variant's discriminant matches the seed data order (1-based)
//! in the corresponding lookup table, and its code matches the `code` column.

use serde::{Deserialize, Serialize};

/// Status ID type matching SMALLINT/SMALLSERIAL in the database.
pub type StatusId = i16;

macro_rules! define_lookup_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:expr => $code:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Every variant, in seed order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Return the database lookup ID.
            pub fn id(self) -> StatusId {
                self as StatusId
            }

            /// Return the stable code stored in the lookup table's `code` column.
            pub fn code(self) -> &'static str {
                match self {
                    $( $name::$variant => $code ),+
                }
            }

            /// Resolve a database lookup ID back into the enum.
            pub fn from_id(id: StatusId) -> Option<Self> {
                match id {
                    $( $val => Some($name::$variant), )+
                    _ => None,
                }
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.code())
            }
        }
    };
}

define_lookup_enum! {
    /// Project lifecycle status.
    ProjectStatus {
        Draft = 1 => "draft",
        Submitted = 2 => "submitted",
        Cancelled = 3 => "cancelled",
        ApprovedByCommittee = 4 => "approved_by_committee",
        DeniedByCommittee = 5 => "denied_by_committee",
        AcceptedByCoordinator = 6 => "accepted_by_coordinator",
        RejectedByCoordinator = 7 => "rejected_by_coordinator",
        ReportSubmitted = 8 => "report_submitted",
        ReportAccepted = 9 => "report_accepted",
        ReportRejected = 10 => "report_rejected",
    }
}

define_lookup_enum! {
    /// Role a user holds on a project.
    ParticipationRole {
        Coordinator = 1 => "coordinator",
        CoCoordinator = 2 => "co_coordinator",
        Participant = 3 => "participant",
        Invitee = 4 => "invitee",
        InvitationDeclined = 5 => "invitation_declined",
    }
}

define_lookup_enum! {
    /// Kind of entry in the per-project audit log.
    EventType {
        Created = 1 => "created",
        Updated = 2 => "updated",
        Submitted = 3 => "submitted",
        Cancelled = 4 => "cancelled",
        CommitteeApproved = 5 => "committee_approved",
        CommitteeDenied = 6 => "committee_denied",
        CoordinatorAccepted = 7 => "coordinator_accepted",
        CoordinatorRejected = 8 => "coordinator_rejected",
        ReportSubmitted = 9 => "report_submitted",
        ReportAccepted = 10 => "report_accepted",
        ReportRejected = 11 => "report_rejected",
        CenterSignedOff = 12 => "center_signed_off",
        StudySignedOff = 13 => "study_signed_off",
        FinanciallyClosed = 14 => "financially_closed",
        Invited = 15 => "invited",
        InvitationAccepted = 16 => "invitation_accepted",
        InvitationDeclined = 17 => "invitation_declined",
        ParticipantRemoved = 18 => "participant_removed",
        CoCoordinatorDesignated = 19 => "co_coordinator_designated",
    }
}

impl ProjectStatus {
    /// Whether the project is still being prepared by its coordinators.
    pub fn is_editable(self) -> bool {
        self == ProjectStatus::Draft
    }
}

impl ParticipationRole {
    /// Roles that lead a project and count towards the coordinator quota.
    pub fn is_coordinating(self) -> bool {
        matches!(
            self,
            ParticipationRole::Coordinator | ParticipationRole::CoCoordinator
        )
    }

    /// Roles that count as team members (invitations excluded).
    pub fn is_member(self) -> bool {
        matches!(
            self,
            ParticipationRole::Coordinator
                | ParticipationRole::CoCoordinator
                | ParticipationRole::Participant
        )
    }
}
