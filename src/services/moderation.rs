//! Moderation service
//!
//! Implements the business operations behind the back office:
//! - Inspect an item: current status, whether the form is editable, which
//!   transition buttons to show
//! - Apply a transition
//! - Gated form edits (optionally bundled with a transition)
//! - Creating drafts, or submitting them straight to review
//! - Public reads (only published items for non-staff)
//!
//! Legality is always decided by `crate::moderation` before the store is
//! touched; a rejected request leaves the store as it was.

use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::hooks::{hook_names, HookManager};
use crate::models::{
    ContentEditInput, ContentItem, ContentKind, ContentStatus, ContentUpdate, CreateContentInput,
    Identity, Role,
};
use crate::moderation::{self, ModerationError, TransitionOption};
use crate::store::ContentStore;

/// Maximum title length accepted from forms
const MAX_TITLE_LEN: usize = 200;

/// Error types for moderation service operations
#[derive(Debug, thiserror::Error)]
pub enum ModerationServiceError {
    /// Item not found (or not visible to the actor)
    #[error("Content not found: {0}")]
    NotFound(String),

    /// Transition not offered for this status and role
    #[error(transparent)]
    IllegalTransition(#[from] ModerationError),

    /// The item's form is locked in its current status
    #[error("Content in status {status} is not editable by role {role}")]
    NotEditable { status: ContentStatus, role: Role },

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Store or other internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// What the back office needs to render an item's moderation controls
#[derive(Debug, Clone, Serialize)]
pub struct ModerationView {
    pub item: ContentItem,
    pub editable: bool,
    pub transitions: Vec<TransitionOption>,
}

pub struct ModerationService {
    store: Arc<dyn ContentStore>,
    hook_manager: Option<Arc<HookManager>>,
}

impl ModerationService {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self {
            store,
            hook_manager: None,
        }
    }

    /// Create a moderation service that fires collaborator hooks
    pub fn with_hooks(store: Arc<dyn ContentStore>, hook_manager: Arc<HookManager>) -> Self {
        Self {
            store,
            hook_manager: Some(hook_manager),
        }
    }

    fn trigger_hook(&self, name: &str, data: serde_json::Value) {
        if let Some(ref manager) = self.hook_manager {
            if manager.has_handlers(name) {
                let result = manager.trigger(name, data);
                debug!(hook = name, payload = %result, "Hook handlers finished");
            }
        }
    }

    async fn load(&self, kind: ContentKind, id: i64) -> Result<ContentItem, ModerationServiceError> {
        self.store
            .get(kind, id)
            .await?
            .ok_or_else(|| ModerationServiceError::NotFound(format!("{} with ID {} not found", kind, id)))
    }

    /// Current status plus the controls offered to `actor`
    pub async fn inspect(
        &self,
        kind: ContentKind,
        id: i64,
        actor: &Identity,
    ) -> Result<ModerationView, ModerationServiceError> {
        let item = self.load(kind, id).await?;
        let editable = moderation::is_editable_by(item.status, &actor.roles);
        let transitions = moderation::transition_options(item.status, &actor.roles);

        Ok(ModerationView {
            item,
            editable,
            transitions,
        })
    }

    /// Move an item to `target` on behalf of `actor`
    pub async fn transition(
        &self,
        kind: ContentKind,
        id: i64,
        target: ContentStatus,
        actor: &Identity,
    ) -> Result<ContentItem, ModerationServiceError> {
        let item = self.load(kind, id).await?;

        let next = match moderation::apply_transition_as(&item, target, &actor.roles) {
            Ok(next) => next,
            Err(err) => {
                warn!(
                    kind = %kind,
                    id,
                    user_id = actor.user_id,
                    "Rejected transition: {}",
                    err
                );
                self.trigger_hook(
                    hook_names::CONTENT_TRANSITION_REJECTED,
                    json!({
                        "kind": kind,
                        "id": id,
                        "from": item.status,
                        "to": target,
                        "user_id": actor.user_id,
                    }),
                );
                return Err(err.into());
            }
        };

        let action = moderation::find_rule(item.status, next.status).map(|rule| rule.action);

        self.trigger_hook(
            hook_names::CONTENT_BEFORE_TRANSITION,
            json!({
                "kind": kind,
                "id": id,
                "action": action,
                "from": item.status,
                "to": next.status,
                "user_id": actor.user_id,
            }),
        );

        let stored = self
            .store
            .update(kind, id, &ContentUpdate::status(next.status))
            .await?
            .ok_or_else(|| ModerationServiceError::NotFound(format!("{} with ID {} not found", kind, id)))?;

        info!(
            kind = %kind,
            id,
            action = action.map(|a| a.as_str()).unwrap_or("none"),
            from = %item.status,
            to = %stored.status,
            user_id = actor.user_id,
            "Content status changed"
        );
        self.trigger_hook(
            hook_names::CONTENT_AFTER_TRANSITION,
            json!({
                "kind": kind,
                "id": id,
                "action": action,
                "from": item.status,
                "to": stored.status,
                "user_id": actor.user_id,
                "username": actor.username,
            }),
        );

        Ok(stored)
    }

    /// Save a form edit.
    ///
    /// The form must be editable in the item's current status. A status in
    /// the input is treated as a transition and checked against the table;
    /// edits alone never change the status.
    pub async fn update_content(
        &self,
        kind: ContentKind,
        id: i64,
        input: ContentEditInput,
        actor: &Identity,
    ) -> Result<ContentItem, ModerationServiceError> {
        let item = self.load(kind, id).await?;

        if !moderation::is_editable_by(item.status, &actor.roles) {
            return Err(ModerationServiceError::NotEditable {
                status: item.status,
                role: actor.roles.primary(),
            });
        }

        if let Some(ref title) = input.title {
            validate_title(title)?;
        }
        if let Some(ref fields) = input.fields {
            validate_fields(fields)?;
        }

        let status = match input.status {
            Some(target) if target != item.status => {
                Some(moderation::apply_transition_as(&item, target, &actor.roles)?.status)
            }
            _ => None,
        };

        let update = ContentUpdate {
            status,
            title: input.title.map(|title| title.trim().to_string()),
            fields: input.fields,
            leader_id: input.leader_id,
        };
        if update.is_empty() {
            debug!(kind = %kind, id, "Empty edit, nothing to store");
            return Ok(item);
        }

        let stored = self
            .store
            .update(kind, id, &update)
            .await?
            .ok_or_else(|| ModerationServiceError::NotFound(format!("{} with ID {} not found", kind, id)))?;

        info!(kind = %kind, id, user_id = actor.user_id, "Content updated");
        self.trigger_hook(
            hook_names::CONTENT_AFTER_UPDATE,
            json!({
                "kind": kind,
                "id": id,
                "status": stored.status,
                "user_id": actor.user_id,
            }),
        );
        if status.is_some() {
            self.trigger_hook(
                hook_names::CONTENT_AFTER_TRANSITION,
                json!({
                    "kind": kind,
                    "id": id,
                    "from": item.status,
                    "to": stored.status,
                    "user_id": actor.user_id,
                    "username": actor.username,
                }),
            );
        }

        Ok(stored)
    }

    /// Create a new item as a draft, or submitted for review.
    ///
    /// Any authenticated member may create a draft. Submitting on creation
    /// needs the same rights as the `draft → review` transition.
    pub async fn create(
        &self,
        kind: ContentKind,
        input: CreateContentInput,
        actor: &Identity,
    ) -> Result<ContentItem, ModerationServiceError> {
        validate_title(&input.title)?;
        validate_fields(&input.fields)?;

        let mut item = ContentItem::new(kind, input.title.trim().to_string(), Some(actor.user_id))
            .with_fields(input.fields);
        if let Some(leader_id) = input.leader_id {
            item = item.with_leader(leader_id);
        }

        if input.submit {
            item = moderation::apply_transition_as(&item, ContentStatus::Review, &actor.roles)?;
        }

        let created = self.store.create(&item).await?;

        info!(
            kind = %kind,
            id = created.id,
            status = %created.status,
            user_id = actor.user_id,
            "Content created"
        );
        self.trigger_hook(
            hook_names::CONTENT_AFTER_CREATE,
            json!({
                "kind": kind,
                "id": created.id,
                "status": created.status,
                "user_id": actor.user_id,
            }),
        );

        Ok(created)
    }

    /// Read an item for display.
    ///
    /// Published items are public. Anything else is only shown to admins and
    /// moderators; everyone else gets `NotFound`.
    pub async fn get_visible(
        &self,
        kind: ContentKind,
        id: i64,
        actor: Option<&Identity>,
    ) -> Result<ContentItem, ModerationServiceError> {
        let item = self.load(kind, id).await?;
        let is_staff = actor.is_some_and(|a| a.roles.is_staff());

        if item.status == ContentStatus::Published || is_staff {
            Ok(item)
        } else {
            Err(ModerationServiceError::NotFound(format!(
                "{} with ID {} not found",
                kind, id
            )))
        }
    }
}

fn validate_title(title: &str) -> Result<(), ModerationServiceError> {
    if title.trim().is_empty() {
        return Err(ModerationServiceError::ValidationError(
            "Title cannot be empty".to_string(),
        ));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(ModerationServiceError::ValidationError(format!(
            "Title cannot exceed {} characters",
            MAX_TITLE_LEN
        )));
    }
    Ok(())
}

fn validate_fields(fields: &serde_json::Value) -> Result<(), ModerationServiceError> {
    if !fields.is_object() {
        return Err(ModerationServiceError::ValidationError(
            "Content fields must be a JSON object".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::PRIORITY_DEFAULT;
    use crate::models::RoleSet;
    use crate::store::MemoryContentStore;
    use proptest::prelude::*;
    use std::sync::Mutex;

    fn admin() -> Identity {
        Identity::new(1, "marta", Role::Admin)
    }

    fn moderator() -> Identity {
        Identity::new(2, "ines", Role::Moderator)
    }

    fn member() -> Identity {
        Identity::new(3, "jon", Role::User)
    }

    async fn setup() -> (Arc<MemoryContentStore>, ModerationService) {
        let store = Arc::new(MemoryContentStore::new());
        let service = ModerationService::new(store.clone());
        (store, service)
    }

    async fn seed(store: &MemoryContentStore, status: ContentStatus) -> ContentItem {
        store
            .insert(
                ContentItem::new(ContentKind::Hike, "Lake loop".to_string(), Some(3))
                    .with_status(status),
            )
            .await
    }

    // ========================================================================
    // inspect
    // ========================================================================

    #[tokio::test]
    async fn test_inspect_draft_as_moderator() {
        let (store, service) = setup().await;
        let item = seed(&store, ContentStatus::Draft).await;

        let view = service.inspect(ContentKind::Hike, item.id, &moderator()).await.unwrap();

        assert!(view.editable);
        assert_eq!(view.transitions.len(), 1);
        assert_eq!(view.transitions[0].target, ContentStatus::Review);
    }

    #[tokio::test]
    async fn test_inspect_published_as_moderator() {
        let (store, service) = setup().await;
        let item = seed(&store, ContentStatus::Published).await;

        let view = service.inspect(ContentKind::Hike, item.id, &moderator()).await.unwrap();

        assert!(!view.editable);
        assert!(view.transitions.is_empty());
    }

    #[tokio::test]
    async fn test_inspect_missing() {
        let (_store, service) = setup().await;
        let result = service.inspect(ContentKind::Pass, 77, &admin()).await;
        assert!(matches!(result, Err(ModerationServiceError::NotFound(_))));
    }

    // ========================================================================
    // transition
    // ========================================================================

    #[tokio::test]
    async fn test_admin_publishes_review() {
        let (store, service) = setup().await;
        let item = seed(&store, ContentStatus::Review).await;

        let published = service
            .transition(ContentKind::Hike, item.id, ContentStatus::Published, &admin())
            .await
            .unwrap();

        assert_eq!(published.status, ContentStatus::Published);
        let stored = store.get(ContentKind::Hike, item.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ContentStatus::Published);
    }

    #[tokio::test]
    async fn test_moderator_publish_is_rejected_without_write() {
        let (store, service) = setup().await;
        let item = seed(&store, ContentStatus::Review).await;

        let result = service
            .transition(ContentKind::Hike, item.id, ContentStatus::Published, &moderator())
            .await;

        assert!(matches!(
            result,
            Err(ModerationServiceError::IllegalTransition(ModerationError::IllegalTransition {
                from: ContentStatus::Review,
                to: ContentStatus::Published,
                role: Role::Moderator,
            }))
        ));
        let stored = store.get(ContentKind::Hike, item.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ContentStatus::Review);
        assert_eq!(stored.updated_at, item.updated_at);
    }

    #[tokio::test]
    async fn test_archived_restore_and_no_direct_publish() {
        let (store, service) = setup().await;
        let item = seed(&store, ContentStatus::Archived).await;

        let result = service
            .transition(ContentKind::Hike, item.id, ContentStatus::Published, &admin())
            .await;
        assert!(matches!(result, Err(ModerationServiceError::IllegalTransition(_))));

        let restored = service
            .transition(ContentKind::Hike, item.id, ContentStatus::Draft, &admin())
            .await
            .unwrap();
        assert_eq!(restored.status, ContentStatus::Draft);
    }

    #[tokio::test]
    async fn test_full_lifecycle() {
        let (store, service) = setup().await;
        let item = seed(&store, ContentStatus::Draft).await;
        let id = item.id;

        let steps = [
            (ContentStatus::Review, moderator()),
            (ContentStatus::Draft, admin()),
            (ContentStatus::Review, moderator()),
            (ContentStatus::Published, admin()),
            (ContentStatus::Archived, admin()),
            (ContentStatus::Draft, admin()),
        ];
        for (target, actor) in steps {
            let next = service.transition(ContentKind::Hike, id, target, &actor).await.unwrap();
            assert_eq!(next.status, target);
        }
    }

    #[tokio::test]
    async fn test_transition_fires_hooks() {
        let store = Arc::new(MemoryContentStore::new());
        let hooks = Arc::new(HookManager::new());
        let seen = Arc::new(Mutex::new(Vec::new()));

        for name in [
            hook_names::CONTENT_BEFORE_TRANSITION,
            hook_names::CONTENT_AFTER_TRANSITION,
            hook_names::CONTENT_TRANSITION_REJECTED,
        ] {
            let seen = seen.clone();
            hooks.register(
                name,
                move |data| {
                    seen.lock().unwrap().push((name, data["to"].clone()));
                    None
                },
                PRIORITY_DEFAULT,
            );
        }

        let service = ModerationService::with_hooks(store.clone(), hooks);
        let item = seed(&store, ContentStatus::Review).await;

        service
            .transition(ContentKind::Hike, item.id, ContentStatus::Published, &moderator())
            .await
            .unwrap_err();
        service
            .transition(ContentKind::Hike, item.id, ContentStatus::Published, &admin())
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                (hook_names::CONTENT_TRANSITION_REJECTED, json!("published")),
                (hook_names::CONTENT_BEFORE_TRANSITION, json!("published")),
                (hook_names::CONTENT_AFTER_TRANSITION, json!("published")),
            ]
        );
    }

    #[tokio::test]
    async fn test_transition_hook_payload_names_action() {
        let store = Arc::new(MemoryContentStore::new());
        let hooks = Arc::new(HookManager::new());
        let payloads = Arc::new(Mutex::new(Vec::new()));

        let sink = payloads.clone();
        hooks.register(
            hook_names::CONTENT_AFTER_TRANSITION,
            move |data| {
                sink.lock().unwrap().push(data.clone());
                None
            },
            PRIORITY_DEFAULT,
        );

        let service = ModerationService::with_hooks(store.clone(), hooks);
        let item = seed(&store, ContentStatus::Archived).await;
        service
            .transition(ContentKind::Hike, item.id, ContentStatus::Draft, &admin())
            .await
            .unwrap();

        let payloads = payloads.lock().unwrap();
        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[0]["action"], "restore");
        assert_eq!(payloads[0]["from"], "archived");
        assert_eq!(payloads[0]["to"], "draft");
        assert_eq!(payloads[0]["username"], "marta");
    }

    // ========================================================================
    // update_content
    // ========================================================================

    #[tokio::test]
    async fn test_moderator_edits_draft() {
        let (store, service) = setup().await;
        let item = seed(&store, ContentStatus::Draft).await;

        let input = ContentEditInput {
            title: Some("Lake loop (long)".to_string()),
            fields: Some(json!({"distance_km": 14})),
            ..Default::default()
        };
        let updated = service
            .update_content(ContentKind::Hike, item.id, input, &moderator())
            .await
            .unwrap();

        assert_eq!(updated.title, "Lake loop (long)");
        assert_eq!(updated.fields, json!({"distance_km": 14}));
        assert_eq!(updated.status, ContentStatus::Draft);
    }

    #[tokio::test]
    async fn test_moderator_cannot_edit_published_or_review() {
        let (store, service) = setup().await;

        for status in [ContentStatus::Published, ContentStatus::Review] {
            let item = seed(&store, status).await;
            let input = ContentEditInput {
                title: Some("Sneaky change".to_string()),
                ..Default::default()
            };

            let result = service
                .update_content(ContentKind::Hike, item.id, input, &moderator())
                .await;

            assert!(matches!(
                result,
                Err(ModerationServiceError::NotEditable { role: Role::Moderator, .. })
            ));
            let stored = store.get(ContentKind::Hike, item.id).await.unwrap().unwrap();
            assert_eq!(stored.title, "Lake loop");
        }
    }

    #[tokio::test]
    async fn test_edit_with_bundled_status_is_checked() {
        let (store, service) = setup().await;
        let item = seed(&store, ContentStatus::Draft).await;

        // Moderator may edit the draft but not publish it in the same request
        let input = ContentEditInput {
            title: Some("Ready".to_string()),
            status: Some(ContentStatus::Published),
            ..Default::default()
        };
        let result = service
            .update_content(ContentKind::Hike, item.id, input, &moderator())
            .await;
        assert!(matches!(result, Err(ModerationServiceError::IllegalTransition(_))));
        let stored = store.get(ContentKind::Hike, item.id).await.unwrap().unwrap();
        assert_eq!(stored.title, "Lake loop");

        // Edit and submit together is fine
        let input = ContentEditInput {
            title: Some("Ready".to_string()),
            status: Some(ContentStatus::Review),
            ..Default::default()
        };
        let updated = service
            .update_content(ContentKind::Hike, item.id, input, &moderator())
            .await
            .unwrap();
        assert_eq!(updated.title, "Ready");
        assert_eq!(updated.status, ContentStatus::Review);
    }

    #[tokio::test]
    async fn test_edited_title_is_trimmed() {
        let (store, service) = setup().await;
        let item = seed(&store, ContentStatus::Draft).await;

        let input = ContentEditInput {
            title: Some("  Lake loop, north shore  ".to_string()),
            ..Default::default()
        };
        let updated = service
            .update_content(ContentKind::Hike, item.id, input, &moderator())
            .await
            .unwrap();

        assert_eq!(updated.title, "Lake loop, north shore");
        let created = service
            .create(ContentKind::Hike, CreateContentInput::new("  Lake loop, north shore  "), &moderator())
            .await
            .unwrap();
        assert_eq!(created.title, updated.title);
    }

    #[tokio::test]
    async fn test_edit_validation() {
        let (store, service) = setup().await;
        let item = seed(&store, ContentStatus::Draft).await;

        let input = ContentEditInput {
            title: Some("   ".to_string()),
            ..Default::default()
        };
        let result = service.update_content(ContentKind::Hike, item.id, input, &admin()).await;
        assert!(matches!(result, Err(ModerationServiceError::ValidationError(_))));

        let input = ContentEditInput {
            fields: Some(json!([1, 2, 3])),
            ..Default::default()
        };
        let result = service.update_content(ContentKind::Hike, item.id, input, &admin()).await;
        assert!(matches!(result, Err(ModerationServiceError::ValidationError(_))));
    }

    // ========================================================================
    // create
    // ========================================================================

    #[tokio::test]
    async fn test_member_creates_draft() {
        let (_store, service) = setup().await;

        let created = service
            .create(ContentKind::News, CreateContentInput::new("Hut reopened"), &member())
            .await
            .unwrap();

        assert_ne!(created.id, 0);
        assert_eq!(created.status, ContentStatus::Draft);
        assert_eq!(created.creator_id, Some(3));
    }

    #[tokio::test]
    async fn test_create_keeps_leader() {
        let (_store, service) = setup().await;

        let mut input = CreateContentInput::new("Summit night hike");
        input.leader_id = Some(12);
        let created = service.create(ContentKind::Hike, input, &member()).await.unwrap();

        assert_eq!(created.leader_id, Some(12));
    }

    #[tokio::test]
    async fn test_member_cannot_submit_on_create() {
        let (store, service) = setup().await;

        let result = service
            .create(
                ContentKind::News,
                CreateContentInput::new("Hut reopened").submitted(),
                &member(),
            )
            .await;

        assert!(matches!(result, Err(ModerationServiceError::IllegalTransition(_))));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_moderator_submits_on_create() {
        let (_store, service) = setup().await;

        let created = service
            .create(
                ContentKind::Pass,
                CreateContentInput::new("Passo Gavia").submitted(),
                &moderator(),
            )
            .await
            .unwrap();

        assert_eq!(created.status, ContentStatus::Review);
    }

    #[tokio::test]
    async fn test_create_empty_title_fails() {
        let (_store, service) = setup().await;
        let result = service
            .create(ContentKind::Article, CreateContentInput::new(""), &admin())
            .await;
        assert!(matches!(result, Err(ModerationServiceError::ValidationError(_))));
    }

    // ========================================================================
    // get_visible
    // ========================================================================

    #[tokio::test]
    async fn test_visibility() {
        let (store, service) = setup().await;
        let draft = seed(&store, ContentStatus::Draft).await;
        let published = seed(&store, ContentStatus::Published).await;

        assert!(service.get_visible(ContentKind::Hike, published.id, None).await.is_ok());
        assert!(matches!(
            service.get_visible(ContentKind::Hike, draft.id, None).await,
            Err(ModerationServiceError::NotFound(_))
        ));
        assert!(service
            .get_visible(ContentKind::Hike, draft.id, Some(&member()))
            .await
            .is_err());
        assert!(service
            .get_visible(ContentKind::Hike, draft.id, Some(&moderator()))
            .await
            .is_ok());
    }

    // ========================================================================
    // Properties
    // ========================================================================

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// The service stores exactly what the pure workflow decides
        #[test]
        fn service_agrees_with_workflow(
            from in proptest::sample::select(ContentStatus::ALL.to_vec()),
            to in proptest::sample::select(ContentStatus::ALL.to_vec()),
            roles in proptest::collection::vec(proptest::sample::select(Role::ALL.to_vec()), 0..3),
        ) {
            let roles: RoleSet = roles.into_iter().collect();
            let actor = Identity::new(5, "prop", roles.clone());

            let (stored_status, result_ok) = tokio_test::block_on(async {
                let (store, service) = setup().await;
                let item = seed(&store, from).await;
                let result = service.transition(ContentKind::Hike, item.id, to, &actor).await;
                let stored = store.get(ContentKind::Hike, item.id).await.unwrap().unwrap();
                (stored.status, result.is_ok())
            });

            let allowed = moderation::allowed_transitions_for(from, &roles).contains(&to);
            prop_assert_eq!(result_ok, allowed);
            prop_assert_eq!(stored_status, if allowed { to } else { from });
        }
    }
}
