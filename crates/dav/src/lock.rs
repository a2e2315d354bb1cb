/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::time::{Duration, Instant};

use ahash::AHashMap;
use dav_proto::{
    Depth, Timeout,
    schema::{property::ActiveLock, request::LockInfo},
};
use parking_lot::Mutex;

use crate::{DavResource, RequestContext};

/// Issues and validates write locks. A resource holds at most one active
/// lock, expired locks are only discovered when looked up.
#[derive(Debug, Default)]
pub struct LockManager {
    index: Mutex<LockIndex>,
}

#[derive(Debug, Default)]
struct LockIndex {
    by_resource: AHashMap<String, CurrentLock>,
    by_token: AHashMap<String, String>,
}

#[derive(Debug, Clone)]
struct CurrentLock {
    token: LockToken,
    resource_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockTimeout {
    Infinite,
    After(Duration),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockToken {
    pub token_id: String,
    pub info: LockInfo,
    pub depth: Depth,
    pub principal: Option<String>,
    pub timeout: LockTimeout,
    pub href: String,
    from: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockFailure {
    AlreadyLocked,
    PreconditionFailed,
    NotAuthorized,
}

pub type LockResult<T = LockToken> = Result<T, LockFailure>;

impl LockManager {
    pub fn new() -> Self {
        LockManager::default()
    }

    pub fn lock(
        &self,
        ctx: &RequestContext<'_>,
        timeout: LockTimeout,
        info: LockInfo,
        resource: &dyn DavResource,
    ) -> LockResult {
        let mut index = self.index.lock();
        let resource_id = resource.unique_id();

        if let Some(current) = index.current(resource_id) {
            trc::event!(
                Lock(trc::LockEvent::AlreadyLocked),
                Id = resource_id.to_string(),
                Token = current.token.token_id.clone(),
                Href = ctx.href().to_string(),
            );
            return Err(LockFailure::AlreadyLocked);
        }

        let token = LockToken {
            token_id: new_token_id(),
            info,
            depth: match ctx.headers.depth {
                Depth::Zero => Depth::Zero,
                _ => Depth::Infinity,
            },
            principal: ctx.principal.map(String::from),
            timeout,
            href: ctx.href().to_string(),
            from: Instant::now(),
        };

        index
            .by_token
            .insert(token.token_id.clone(), resource_id.to_string());
        index.by_resource.insert(
            resource_id.to_string(),
            CurrentLock {
                token: token.clone(),
                resource_id: resource_id.to_string(),
            },
        );

        trc::event!(
            Lock(trc::LockEvent::Acquired),
            Id = resource_id.to_string(),
            Token = token.token_id.clone(),
            Href = token.href.clone(),
            Timeout = token.timeout.as_secs(),
        );

        Ok(token)
    }

    /// Restarts the lock lifetime, optionally with a new duration. The lock
    /// is resolved through its token.
    pub fn refresh(
        &self,
        token_id: &str,
        timeout: Option<LockTimeout>,
        resource: &dyn DavResource,
    ) -> LockResult {
        let mut index = self.index.lock();
        let locked_id = index.by_token.get(token_id).cloned();

        match locked_id
            .as_deref()
            .and_then(|locked_id| index.current_mut(locked_id))
        {
            Some(current) if current.token.token_id == token_id => {
                current.token.from = Instant::now();
                if let Some(timeout) = timeout {
                    current.token.timeout = timeout;
                }

                trc::event!(
                    Lock(trc::LockEvent::Refreshed),
                    Id = current.resource_id.clone(),
                    Token = token_id.to_string(),
                    Timeout = current.token.timeout.as_secs(),
                );

                Ok(current.token.clone())
            }
            _ => {
                trc::event!(
                    Lock(trc::LockEvent::NotFound),
                    Id = resource.unique_id().to_string(),
                    Token = token_id.to_string(),
                );

                Err(LockFailure::PreconditionFailed)
            }
        }
    }

    pub fn unlock(&self, token_id: &str, resource: &dyn DavResource) -> LockResult<()> {
        let mut index = self.index.lock();
        let resource_id = resource.unique_id();

        match index
            .current(resource_id)
            .map(|current| current.token.token_id == token_id)
        {
            Some(true) => {
                index.remove(resource_id);

                trc::event!(
                    Lock(trc::LockEvent::Released),
                    Id = resource_id.to_string(),
                    Token = token_id.to_string(),
                );

                Ok(())
            }
            Some(false) => {
                trc::event!(
                    Lock(trc::LockEvent::TokenMismatch),
                    Id = resource_id.to_string(),
                    Token = token_id.to_string(),
                );

                Err(LockFailure::NotAuthorized)
            }
            None => Ok(()),
        }
    }

    pub fn current_token(&self, resource: &dyn DavResource) -> Option<LockToken> {
        self.index
            .lock()
            .current(resource.unique_id())
            .map(|current| current.token.clone())
    }

    /// Write access check, succeeds when the resource is unlocked or one of
    /// the submitted tokens is the current lock token.
    pub fn check_write<'x>(
        &self,
        resource: &dyn DavResource,
        mut submitted: impl Iterator<Item = &'x str>,
    ) -> LockResult<()> {
        match self.index.lock().current(resource.unique_id()) {
            Some(current) if !submitted.any(|token| token == current.token.token_id) => {
                Err(LockFailure::AlreadyLocked)
            }
            _ => Ok(()),
        }
    }

    pub fn len(&self) -> usize {
        self.index.lock().by_resource.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LockIndex {
    fn current(&mut self, resource_id: &str) -> Option<&CurrentLock> {
        self.current_mut(resource_id).map(|current| &*current)
    }

    fn current_mut(&mut self, resource_id: &str) -> Option<&mut CurrentLock> {
        if self
            .by_resource
            .get(resource_id)
            .is_some_and(|current| current.token.is_expired())
        {
            if let Some(expired) = self.remove(resource_id) {
                trc::event!(
                    Lock(trc::LockEvent::Expired),
                    Id = expired.resource_id,
                    Token = expired.token.token_id,
                );
            }
            None
        } else {
            self.by_resource.get_mut(resource_id)
        }
    }

    fn remove(&mut self, resource_id: &str) -> Option<CurrentLock> {
        let current = self.by_resource.remove(resource_id)?;
        self.by_token.remove(&current.token.token_id);
        Some(current)
    }
}

impl LockToken {
    pub fn is_expired(&self) -> bool {
        match self.timeout {
            LockTimeout::Infinite => false,
            LockTimeout::After(duration) => self.from.elapsed() >= duration,
        }
    }

    /// Remaining lifetime in seconds, `None` for infinite locks.
    pub fn remaining(&self) -> Option<u64> {
        match self.timeout {
            LockTimeout::Infinite => None,
            LockTimeout::After(duration) => {
                let remaining = duration.saturating_sub(self.from.elapsed());
                Some(remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0))
            }
        }
    }

    pub fn to_active_lock(&self) -> ActiveLock {
        let lock = ActiveLock::new(self.href.clone(), self.info.lock_scope)
            .with_depth(self.depth)
            .with_owner_opt(self.info.owner.clone())
            .with_lock_token(self.token_id.clone());

        match self.remaining() {
            Some(remaining) => lock.with_timeout(remaining),
            None => lock,
        }
    }
}

impl LockTimeout {
    /// Honours the client preference within the configured limits.
    pub fn from_request(requested: Timeout, default: Duration, max: Duration) -> Self {
        let duration = match requested {
            Timeout::Second(seconds) => Duration::from_secs(seconds),
            Timeout::Infinite => max,
            Timeout::None => default,
        };
        LockTimeout::After(duration.min(max))
    }

    pub fn as_secs(&self) -> u64 {
        match self {
            LockTimeout::Infinite => u64::MAX,
            LockTimeout::After(duration) => duration.as_secs(),
        }
    }
}

impl LockFailure {
    pub fn as_str(&self) -> &'static str {
        match self {
            LockFailure::AlreadyLocked => "ALREADY_LOCKED",
            LockFailure::PreconditionFailed => "PRECONDITION_FAILED",
            LockFailure::NotAuthorized => "NOT_AUTHORIZED",
        }
    }
}

fn new_token_id() -> String {
    format!("urn:stalwart:davlock:{:x}", rand::random::<u64>())
}

#[cfg(test)]
mod tests {
    use std::{any::Any, time::Duration};

    use common::config::dav::DavConfig;
    use dav_proto::{
        Depth, RequestHeaders, Timeout,
        schema::{
            property::{LockScope, Privilege},
            request::LockInfo,
        },
    };

    use crate::{DavMethod, DavResource, RequestContext};

    use super::{LockFailure, LockManager, LockTimeout};

    struct File(&'static str);

    impl DavResource for File {
        fn unique_id(&self) -> &str {
            self.0
        }

        fn name(&self) -> &str {
            self.0
        }

        fn authorise(&self, _: Option<&str>, _: DavMethod) -> bool {
            true
        }

        fn privileges(&self, _: Option<&str>) -> Vec<Privilege> {
            vec![Privilege::All]
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn ctx(config: &DavConfig) -> RequestContext<'_> {
        RequestContext::new(config, DavMethod::LOCK, RequestHeaders::new("/docs/report.txt"))
            .with_principal("jane")
    }

    fn info() -> LockInfo {
        LockInfo {
            owner: Some("mailto:jane@example.com".into()),
            ..Default::default()
        }
    }

    #[test]
    fn lock_round_trip() {
        let config = DavConfig::default();
        let ctx = ctx(&config);
        let locks = LockManager::new();
        let file = File("report");

        let token = locks
            .lock(&ctx, LockTimeout::Infinite, info(), &file)
            .unwrap();
        assert!(
            token
                .token_id
                .strip_prefix("urn:stalwart:davlock:")
                .is_some_and(|id| u64::from_str_radix(id, 16).is_ok())
        );
        assert_eq!(token.principal.as_deref(), Some("jane"));
        assert_eq!(token.depth, Depth::Infinity);
        assert_eq!(
            locks.lock(&ctx, LockTimeout::Infinite, info(), &file),
            Err(LockFailure::AlreadyLocked)
        );
        assert_eq!(locks.current_token(&file), Some(token.clone()));

        // Locks are keyed by resource identity
        locks
            .lock(&ctx, LockTimeout::Infinite, info(), &File("other"))
            .unwrap();
        assert_eq!(locks.len(), 2);

        locks.unlock(&token.token_id, &file).unwrap();
        assert_eq!(locks.current_token(&file), None);
        assert!(
            locks
                .lock(&ctx, LockTimeout::Infinite, info(), &file)
                .is_ok()
        );
    }

    #[test]
    fn unlock_with_wrong_token() {
        let config = DavConfig::default();
        let ctx = ctx(&config);
        let locks = LockManager::new();
        let file = File("report");

        // Unlocking an unlocked resource is a no-op
        assert_eq!(locks.unlock("urn:uuid:missing", &file), Ok(()));

        let token = locks
            .lock(&ctx, LockTimeout::Infinite, info(), &file)
            .unwrap();
        assert_eq!(
            locks.unlock("urn:uuid:forged", &file),
            Err(LockFailure::NotAuthorized)
        );
        assert_eq!(
            locks.current_token(&file).map(|token| token.token_id),
            Some(token.token_id.clone())
        );
        assert_eq!(
            locks.check_write(&file, ["urn:uuid:forged"].into_iter()),
            Err(LockFailure::AlreadyLocked)
        );
        assert_eq!(
            locks.check_write(&file, [token.token_id.as_str()].into_iter()),
            Ok(())
        );
        assert_eq!(locks.check_write(&File("other"), [].into_iter()), Ok(()));
    }

    #[test]
    fn lazy_expiry() {
        let config = DavConfig::default();
        let ctx = ctx(&config);
        let locks = LockManager::new();
        let file = File("report");

        let token = locks
            .lock(
                &ctx,
                LockTimeout::After(Duration::from_millis(50)),
                info(),
                &file,
            )
            .unwrap();
        assert_eq!(
            locks.lock(&ctx, LockTimeout::Infinite, info(), &file),
            Err(LockFailure::AlreadyLocked)
        );

        std::thread::sleep(Duration::from_millis(100));

        // Still indexed until the next lookup
        assert_eq!(locks.len(), 1);
        assert_eq!(
            locks.refresh(&token.token_id, None, &file),
            Err(LockFailure::PreconditionFailed)
        );
        assert!(locks.is_empty());
        assert!(
            locks
                .lock(&ctx, LockTimeout::Infinite, info(), &file)
                .is_ok()
        );
    }

    #[test]
    fn refresh_extends_expiry() {
        let config = DavConfig::default();
        let ctx = ctx(&config);
        let locks = LockManager::new();
        let file = File("report");

        assert_eq!(
            locks.refresh("urn:uuid:missing", None, &file),
            Err(LockFailure::PreconditionFailed)
        );

        let token = locks
            .lock(
                &ctx,
                LockTimeout::After(Duration::from_millis(150)),
                info(),
                &file,
            )
            .unwrap();
        std::thread::sleep(Duration::from_millis(100));

        let refreshed = locks.refresh(&token.token_id, None, &file).unwrap();
        assert_eq!(refreshed.token_id, token.token_id);
        assert!(refreshed.from > token.from);

        std::thread::sleep(Duration::from_millis(100));
        assert!(locks.current_token(&file).is_some());

        let refreshed = locks
            .refresh(
                &token.token_id,
                Some(LockTimeout::After(Duration::from_secs(3600))),
                &file,
            )
            .unwrap();
        assert_eq!(refreshed.timeout.as_secs(), 3600);

        // Tokens are resolved through the token index
        let refreshed = locks
            .refresh(&token.token_id, None, &File("other"))
            .unwrap();
        assert_eq!(refreshed.token_id, token.token_id);
        assert_eq!(refreshed.href, "/docs/report.txt");
        assert_eq!(locks.len(), 1);

        // Released tokens are gone from both indexes
        locks.unlock(&token.token_id, &file).unwrap();
        assert_eq!(
            locks.refresh(&token.token_id, None, &File("other")),
            Err(LockFailure::PreconditionFailed)
        );
    }

    #[test]
    fn active_lock_view() {
        let config = DavConfig::default();
        let ctx = ctx(&config);
        let locks = LockManager::new();
        let token = locks
            .lock(
                &ctx,
                LockTimeout::After(Duration::from_secs(600)),
                info(),
                &File("report"),
            )
            .unwrap();

        let active = token.to_active_lock();
        assert_eq!(active.lock_scope, LockScope::Exclusive);
        assert_eq!(active.lock_root, "/docs/report.txt");
        assert_eq!(active.owner.as_deref(), Some("mailto:jane@example.com"));
        assert_eq!(active.lock_token, Some(token.token_id));
        assert!(matches!(active.timeout, Timeout::Second(590..=600)));
    }

    #[test]
    fn requested_timeouts() {
        let default = Duration::from_secs(60);
        let max = Duration::from_secs(3600);

        for (requested, expected) in [
            (Timeout::None, 60),
            (Timeout::Second(120), 120),
            (Timeout::Second(86400), 3600),
            (Timeout::Infinite, 3600),
        ] {
            assert_eq!(
                LockTimeout::from_request(requested, default, max),
                LockTimeout::After(Duration::from_secs(expected))
            );
        }
    }
}
