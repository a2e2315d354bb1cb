/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::*;

impl ServerEvent {
    pub fn description(&self) -> &'static str {
        match self {
            ServerEvent::Startup => "Starting server",
            ServerEvent::Shutdown => "Shutting down server",
            ServerEvent::StartupError => "Server startup error",
            ServerEvent::ThreadError => "Server thread error",
        }
    }

    pub fn explain(&self) -> &'static str {
        match self {
            ServerEvent::Startup => "The server is starting up",
            ServerEvent::Shutdown => "The server is shutting down",
            ServerEvent::StartupError => "An error occurred while starting the server",
            ServerEvent::ThreadError => "A worker thread could not be started",
        }
    }
}

impl NetworkEvent {
    pub fn description(&self) -> &'static str {
        match self {
            NetworkEvent::ConnectionStart => "Network connection started",
            NetworkEvent::ConnectionEnd => "Network connection ended",
            NetworkEvent::ListenStart => "Network listener started",
            NetworkEvent::ListenStop => "Network listener stopped",
            NetworkEvent::ListenError => "Network listener error",
            NetworkEvent::BindError => "Network bind error",
            NetworkEvent::AcceptError => "Network accept error",
            NetworkEvent::ReadError => "Network read error",
            NetworkEvent::WriteError => "Network write error",
            NetworkEvent::Timeout => "Network timeout",
            NetworkEvent::Closed => "Network connection closed",
        }
    }

    pub fn explain(&self) -> &'static str {
        match self {
            NetworkEvent::ConnectionStart => "A new connection was accepted",
            NetworkEvent::ConnectionEnd => "A connection was closed",
            NetworkEvent::ListenStart => "The listener is accepting connections",
            NetworkEvent::ListenStop => "The listener stopped accepting connections",
            NetworkEvent::ListenError => "The listener failed while accepting connections",
            NetworkEvent::BindError => "The listener could not bind to its address",
            NetworkEvent::AcceptError => "A connection could not be accepted",
            NetworkEvent::ReadError => "Reading from the connection failed",
            NetworkEvent::WriteError => "Writing to the connection failed",
            NetworkEvent::Timeout => "The connection was idle for too long",
            NetworkEvent::Closed => "The remote end closed the connection",
        }
    }
}

impl ConfigEvent {
    pub fn description(&self) -> &'static str {
        match self {
            ConfigEvent::ParseError => "Configuration parse error",
            ConfigEvent::BuildError => "Configuration build error",
            ConfigEvent::MacroError => "Configuration macro error",
            ConfigEvent::ParseWarning => "Configuration parse warning",
            ConfigEvent::BuildWarning => "Configuration build warning",
            ConfigEvent::MissingSetting => "Missing configuration setting",
            ConfigEvent::DefaultApplied => "Default configuration applied",
            ConfigEvent::UnusedSetting => "Unused configuration setting",
        }
    }

    pub fn explain(&self) -> &'static str {
        match self {
            ConfigEvent::ParseError => "A configuration value could not be parsed",
            ConfigEvent::BuildError => "A configuration section could not be built",
            ConfigEvent::MacroError => "A configuration macro could not be expanded",
            ConfigEvent::ParseWarning => "A configuration value was parsed with warnings",
            ConfigEvent::BuildWarning => "A configuration section was built with warnings",
            ConfigEvent::MissingSetting => "A required configuration setting is missing",
            ConfigEvent::DefaultApplied => "A default value was used for a setting",
            ConfigEvent::UnusedSetting => "A configuration setting is not used",
        }
    }
}

impl AuthEvent {
    pub fn description(&self) -> &'static str {
        match self {
            AuthEvent::Success => "Authentication successful",
            AuthEvent::Failed => "Authentication failed",
            AuthEvent::Error => "Authentication error",
            AuthEvent::TooManyAttempts => "Too many authentication attempts",
        }
    }

    pub fn explain(&self) -> &'static str {
        match self {
            AuthEvent::Success => "The client authenticated successfully",
            AuthEvent::Failed => "The client supplied invalid credentials",
            AuthEvent::Error => "The credentials could not be verified",
            AuthEvent::TooManyAttempts => "The client failed to authenticate too many times",
        }
    }
}

impl WebDavEvent {
    pub fn description(&self) -> &'static str {
        match self {
            WebDavEvent::Propfind => "WebDAV PROPFIND request",
            WebDavEvent::Proppatch => "WebDAV PROPPATCH request",
            WebDavEvent::Options => "WebDAV OPTIONS request",
            WebDavEvent::Lock => "WebDAV LOCK request",
            WebDavEvent::Unlock => "WebDAV UNLOCK request",
            WebDavEvent::PropertyNotFound => "WebDAV property not found",
            WebDavEvent::TypeMismatch => "WebDAV property type mismatch",
            WebDavEvent::RequestTooLarge => "WebDAV request too large",
            WebDavEvent::Error => "WebDAV error",
        }
    }

    pub fn explain(&self) -> &'static str {
        match self {
            WebDavEvent::Propfind => "The client requested resource properties",
            WebDavEvent::Proppatch => "The client requested property changes",
            WebDavEvent::Options => "The client requested the supported methods",
            WebDavEvent::Lock => "The client requested or refreshed a lock",
            WebDavEvent::Unlock => "The client released a lock",
            WebDavEvent::PropertyNotFound => "No property source handles the requested property",
            WebDavEvent::TypeMismatch => {
                "No value writer supports the value produced for a property"
            }
            WebDavEvent::RequestTooLarge => "The request body exceeds the configured limit",
            WebDavEvent::Error => "An error occurred while processing a WebDAV request",
        }
    }
}

impl LockEvent {
    pub fn description(&self) -> &'static str {
        match self {
            LockEvent::Acquired => "Lock acquired",
            LockEvent::Refreshed => "Lock refreshed",
            LockEvent::Released => "Lock released",
            LockEvent::AlreadyLocked => "Resource is already locked",
            LockEvent::NotFound => "Lock not found",
            LockEvent::Expired => "Lock expired",
            LockEvent::TokenMismatch => "Lock token mismatch",
        }
    }

    pub fn explain(&self) -> &'static str {
        match self {
            LockEvent::Acquired => "A new lock was granted on a resource",
            LockEvent::Refreshed => "The expiry of an existing lock was extended",
            LockEvent::Released => "A lock was released by its owner",
            LockEvent::AlreadyLocked => "The resource holds a lock that has not expired",
            LockEvent::NotFound => "The supplied lock token does not match an active lock",
            LockEvent::Expired => "An expired lock was discarded",
            LockEvent::TokenMismatch => "The supplied lock token belongs to another lock",
        }
    }
}

impl Pop3Event {
    pub fn description(&self) -> &'static str {
        match self {
            Pop3Event::Error => "POP3 error occurred",
            Pop3Event::Capabilities => "POP3 CAPA command",
            Pop3Event::User => "POP3 USER command",
            Pop3Event::Authenticate => "POP3 authentication command",
            Pop3Event::Noop => "POP3 NOOP command",
            Pop3Event::Quit => "POP3 QUIT command",
            Pop3Event::List => "POP3 LIST command",
            Pop3Event::Fetch => "POP3 FETCH command",
            Pop3Event::Uidl => "POP3 UIDL command",
            Pop3Event::Delete => "POP3 DELE command",
            Pop3Event::Reset => "POP3 RSET command",
            Pop3Event::Stat => "POP3 STAT command",
            Pop3Event::RawInput => "Raw POP3 input received",
            Pop3Event::RawOutput => "Raw POP3 output sent",
        }
    }

    pub fn explain(&self) -> &'static str {
        match self {
            Pop3Event::Error => "An error occurred during a POP3 command",
            Pop3Event::Capabilities => "Client requested server capabilities",
            Pop3Event::User => "Client sent a user name",
            Pop3Event::Authenticate => "Client attempted to authenticate",
            Pop3Event::Noop => "Client sent a NOOP command",
            Pop3Event::Quit => "Client quit the session",
            Pop3Event::List => "Client listed messages",
            Pop3Event::Fetch => "Client fetched a message",
            Pop3Event::Uidl => "Client requested unique identifiers",
            Pop3Event::Delete => "Client marked a message for deletion",
            Pop3Event::Reset => "Client reset the session",
            Pop3Event::Stat => "Client requested mailbox status",
            Pop3Event::RawInput => "Raw POP3 input received",
            Pop3Event::RawOutput => "Raw POP3 output sent",
        }
    }
}

impl StoreEvent {
    pub fn description(&self) -> &'static str {
        match self {
            StoreEvent::NotFound => "Record not found in store",
            StoreEvent::DataCorruption => "Data corruption detected",
            StoreEvent::UnexpectedError => "Unexpected store error",
        }
    }

    pub fn explain(&self) -> &'static str {
        match self {
            StoreEvent::NotFound => "The requested record was not found",
            StoreEvent::DataCorruption => "A stored record could not be decoded",
            StoreEvent::UnexpectedError => "The store returned an unexpected error",
        }
    }
}

impl ResourceEvent {
    pub fn description(&self) -> &'static str {
        match self {
            ResourceEvent::NotFound => "Resource not found",
            ResourceEvent::BadParameters => "Bad resource parameters",
            ResourceEvent::Error => "Resource error",
        }
    }

    pub fn explain(&self) -> &'static str {
        match self {
            ResourceEvent::NotFound => "The requested resource does not exist",
            ResourceEvent::BadParameters => "The resource parameters are invalid",
            ResourceEvent::Error => "An error occurred while accessing a resource",
        }
    }
}
