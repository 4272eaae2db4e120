mod client;
mod dto;

pub use client::{InvitationsClient, INVITATIONS_PATH};
pub use dto::{AcceptOutcome, Invitation, NewInvitation};
