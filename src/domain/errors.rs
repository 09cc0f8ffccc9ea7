// Domain-level errors for guest session workflows.
#[derive(Debug)]
pub enum SessionError {
    EmptyCode,
    UnknownCode,
    NoActiveSession,
    // A newer lookup took over before this one committed.
    Superseded,
    StoreFailure,
}

// Domain-level errors for admin registry workflows.
#[derive(Debug)]
pub enum RegistryError {
    MissingGuestName,
    InvalidContact,
    UnknownCode,
}

// Domain-level errors for admin access workflows.
#[derive(Debug)]
pub enum AccessError {
    InvalidPasscode,
    InvalidToken,
    SessionExpired,
}

// Domain-level errors for guestbook and prediction submissions.
#[derive(Debug)]
pub enum SubmissionError {
    EmptyMessage,
    UnknownEntry,
    StorageFailure,
}
