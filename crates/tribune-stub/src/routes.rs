// SPDX-License-Identifier: BUSL-1.1
//! Route definitions for the Tribune backend stub.
//!
//! Implements the endpoints that `tribune-client` calls, with responses
//! that deserialize cleanly into the client's types (`_id` identifiers,
//! camelCase fields, bare arrays for listings).
//!
//! ## Paths
//!
//! | Method | Path | Auth |
//! |--------|------|------|
//! | GET    | `/health` | none |
//! | POST   | `/users/login` | none |
//! | GET    | `/users` | bearer |
//! | GET    | `/communities` | bearer |
//! | POST   | `/communities` | bearer |
//! | GET    | `/communities/:id` | bearer |
//! | DELETE | `/communities/:id` | bearer |
//! | POST   | `/communities/verify-email/send` | bearer |
//! | POST   | `/communities/verify-email/confirm` | bearer |
//! | POST   | `/communities/:id/invite-authorized` | bearer |
//! | POST   | `/communities/authorized/approve` | bearer |
//! | POST   | `/communities/:id/join` | bearer |
//! | POST   | `/communities/request/approve` | bearer |
//! | POST   | `/communities/request/reject` | bearer |
//! | GET    | `/communities/:id/posts` | bearer |
//! | POST   | `/communities/posts` | bearer |
//! | PATCH  | `/communities/posts/:post_id/like` | bearer |
//! | PATCH  | `/communities/posts/:post_id/share` | bearer |

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use tribune_core::{
    CommunityId, CommunityStatus, CommunityType, Email, OtpCode, PostId, PostType, UserId,
    ValidationError,
};
use tribune_state::{VerificationTarget, WizardDraft};

use crate::auth::{require_bearer, Caller};
use crate::error::StubError;
use crate::store::{
    new_community_id, new_post_id, AppState, CommunityRecord, JoinRequest, PostRecord, Reaction,
};

/// Build the complete router with all stub routes.
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/users", get(list_users))
        .route("/communities", get(list_communities).post(create_community))
        .route("/communities/verify-email/send", post(send_email_otp))
        .route("/communities/verify-email/confirm", post(confirm_email_otp))
        .route("/communities/authorized/approve", post(approve_authorized))
        .route(
            "/communities/:id",
            get(get_community).delete(delete_community),
        )
        .route("/communities/:id/invite-authorized", post(invite_authorized))
        .route("/communities/:id/join", post(request_join))
        .route("/communities/request/approve", post(approve_join))
        .route("/communities/request/reject", post(reject_join))
        .route("/communities/:id/posts", get(list_posts))
        .route("/communities/posts", post(create_post))
        .route("/communities/posts/:post_id/like", patch(like_post))
        .route("/communities/posts/:post_id/share", patch(share_post))
        .route_layer(from_fn_with_state(state.clone(), require_bearer));

    Router::new()
        .route("/health", get(health))
        .route("/users/login", post(login))
        .merge(protected)
        // Fallback: 501 Not Implemented
        .fallback(not_implemented)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Unwrap a JSON body, turning extractor rejections into `{"message"}` 400s.
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, StubError> {
    payload
        .map(|Json(v)| v)
        .map_err(|rejection| StubError::BadRequest(rejection.body_text()))
}

fn community_id(raw: &str) -> Result<CommunityId, StubError> {
    CommunityId::new(raw).map_err(|_| StubError::community_not_found())
}

fn load_community(state: &AppState, id: &CommunityId) -> Result<CommunityRecord, StubError> {
    state.community(id).ok_or_else(StubError::community_not_found)
}

// ── Health ──────────────────────────────────────────────────────────

async fn health() -> StatusCode {
    StatusCode::OK
}

// ── Users ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

fn invalid_credentials() -> StubError {
    StubError::BadRequest("Invalid email or password".into())
}

async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginBody>, JsonRejection>,
) -> Result<Json<Value>, StubError> {
    let LoginBody { email, password } = body(payload)?;
    let email = Email::new(email).map_err(|_| invalid_credentials())?;
    let Some(user) = state.authenticate(&email, &password) else {
        tracing::info!("login rejected");
        return Err(invalid_credentials());
    };
    let token = state.issue_token(&user.id);
    tracing::info!(user_id = %user.id, role = ?user.role, "login succeeded");
    Ok(Json(json!({ "token": token, "user": user.to_json() })))
}

async fn list_users(State(state): State<AppState>) -> Json<Value> {
    Json(Value::Array(
        state.users().iter().map(|u| u.to_json()).collect(),
    ))
}

// ── Communities ─────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateCommunityBody {
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
    #[serde(rename = "type", default)]
    community_type: Option<String>,
    #[serde(default)]
    image: String,
    #[serde(default)]
    creator_id: Option<String>,
    #[serde(default)]
    domain_email: Option<String>,
    #[serde(default)]
    authorized_persons: Option<Vec<String>>,
}

fn parse_type(raw: Option<&str>) -> Result<CommunityType, StubError> {
    match raw {
        Some("Single") => Ok(CommunityType::Single),
        Some("Multi") => Ok(CommunityType::Multi),
        _ => Err(StubError::BadRequest(
            "type must be Single or Multi".into(),
        )),
    }
}

async fn list_communities(State(state): State<AppState>) -> Json<Vec<CommunityRecord>> {
    Json(state.communities())
}

async fn get_community(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CommunityRecord>, StubError> {
    let id = community_id(&id)?;
    Ok(Json(load_community(&state, &id)?))
}

async fn create_community(
    State(state): State<AppState>,
    Extension(Caller(caller)): Extension<Caller>,
    payload: Result<Json<CreateCommunityBody>, JsonRejection>,
) -> Result<(StatusCode, Json<CommunityRecord>), StubError> {
    let req = body(payload)?;
    let draft = WizardDraft {
        name: req.name,
        description: req.description,
        community_type: parse_type(req.community_type.as_deref())?,
        image: req.image,
        domain_email: req.domain_email.unwrap_or_default(),
        authorized_persons: req.authorized_persons.unwrap_or_default(),
    };
    let validated = draft.validate()?;

    let creator = match req.creator_id {
        Some(raw) => {
            let id = UserId::new(raw)?;
            if state.user(&id).is_none() {
                return Err(StubError::BadRequest("Unknown creatorId".into()));
            }
            id
        }
        None => caller,
    };

    let community_type = validated.community_type();
    let (domain_email, authorized_persons) = match validated.target {
        VerificationTarget::DomainEmail(email) => (Some(email), Vec::new()),
        VerificationTarget::AuthorizedPersons(list) => (None, list),
    };
    let id = new_community_id().map_err(|e| StubError::Internal(e.to_string()))?;
    let record = state.insert_community(CommunityRecord {
        id,
        name: validated.name,
        description: validated.description,
        community_type,
        status: CommunityStatus::Pending,
        image: validated.image,
        domain_email,
        authorized_persons,
        creator,
        approvals: 0,
        otp_confirmations: 0,
        members: Vec::new(),
        join_requests: Vec::new(),
        created_at: Utc::now(),
    });
    tracing::info!(
        community_id = %record.id,
        community_type = %record.community_type,
        "community created"
    );
    Ok((StatusCode::CREATED, Json(record)))
}

async fn delete_community(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, StubError> {
    let id = community_id(&id)?;
    state
        .remove_community(&id)
        .ok_or_else(StubError::community_not_found)?;
    tracing::info!(community_id = %id, "community deleted");
    Ok(Json(json!({ "message": "Community deleted" })))
}

// ── Domain-email verification ───────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendOtpBody {
    community_id: String,
    #[serde(default)]
    domain_email: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfirmOtpBody {
    community_id: String,
    otp: String,
}

/// A Pending Single community, or the reason it cannot take an email OTP.
fn single_pending(state: &AppState, raw_id: &str) -> Result<CommunityRecord, StubError> {
    let community = load_community(state, &community_id(raw_id)?)?;
    if community.community_type != CommunityType::Single {
        return Err(StubError::BadRequest(
            "Community does not use domain-email verification".into(),
        ));
    }
    if community.status == CommunityStatus::Active {
        return Err(StubError::Conflict("Community is already active".into()));
    }
    Ok(community)
}

async fn send_email_otp(
    State(state): State<AppState>,
    payload: Result<Json<SendOtpBody>, JsonRejection>,
) -> Result<Json<Value>, StubError> {
    let req = body(payload)?;
    let community = single_pending(&state, &req.community_id)?;
    let Some(stored) = community.domain_email else {
        return Err(StubError::Internal(format!(
            "Single community {} has no domain email",
            community.id
        )));
    };
    if let Some(raw) = req.domain_email {
        if Email::new(raw)? != stored {
            return Err(StubError::BadRequest(
                "Domain email does not match the community".into(),
            ));
        }
    }

    let code = state.issue_email_ticket(&community.id);
    tracing::info!(community_id = %community.id, "domain-email OTP issued");
    Ok(Json(json!({
        "message": format!("OTP sent to {stored}"),
        "otp": code,
    })))
}

async fn confirm_email_otp(
    State(state): State<AppState>,
    payload: Result<Json<ConfirmOtpBody>, JsonRejection>,
) -> Result<Json<Value>, StubError> {
    let req = body(payload)?;
    let community = single_pending(&state, &req.community_id)?;
    let otp = OtpCode::new(req.otp).map_err(|_| StubError::invalid_otp())?;
    if !state.redeem_email_ticket(&community.id, &otp) {
        tracing::warn!(community_id = %community.id, "domain-email OTP rejected");
        return Err(StubError::invalid_otp());
    }

    let updated = state
        .record_evidence(&community.id, |c| c.otp_confirmations += 1)
        .ok_or_else(StubError::community_not_found)?;
    tracing::info!(
        community_id = %community.id,
        status = %updated.status,
        "domain email confirmed"
    );
    Ok(Json(json!({
        "message": "Community verified",
        "status": updated.status,
    })))
}

// ── Authorized-person invites ───────────────────────────────────────

#[derive(Deserialize)]
struct InviteBody {
    email: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApproveBody {
    community_id: String,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    email: Option<String>,
    otp: String,
}

fn require_multi(community: &CommunityRecord) -> Result<(), StubError> {
    if community.community_type != CommunityType::Multi {
        return Err(StubError::BadRequest(
            "Community does not use authorized-person approval".into(),
        ));
    }
    Ok(())
}

async fn invite_authorized(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<InviteBody>, JsonRejection>,
) -> Result<Json<Value>, StubError> {
    let req = body(payload)?;
    let community = load_community(&state, &community_id(&id)?)?;
    require_multi(&community)?;
    let email = Email::new(req.email)?;
    if !community.authorized_persons.contains(&email) {
        return Err(StubError::BadRequest(
            "Email is not an authorized person for this community".into(),
        ));
    }

    let Some(code) = state.issue_invite(&community.id, &email) else {
        return Err(StubError::Conflict("Invite already approved".into()));
    };
    tracing::info!(community_id = %community.id, email = %email, "authorized invite issued");
    Ok(Json(json!({
        "message": format!("Invitation sent to {email}"),
        "otp": code,
    })))
}

async fn approve_authorized(
    State(state): State<AppState>,
    payload: Result<Json<ApproveBody>, JsonRejection>,
) -> Result<Json<Value>, StubError> {
    let req = body(payload)?;
    let community = load_community(&state, &community_id(&req.community_id)?)?;
    require_multi(&community)?;

    let email = match (req.user_id, req.email) {
        (Some(uid), _) => {
            let user = state
                .user(&UserId::new(uid)?)
                .ok_or_else(|| StubError::NotFound("User not found".into()))?;
            user.email
        }
        (None, Some(raw)) => Email::new(raw)?,
        (None, None) => {
            return Err(StubError::BadRequest("userId or email is required".into()));
        }
    };

    let invite = state
        .invite(&community.id, &email)
        .ok_or_else(|| StubError::NotFound("No invitation for this email".into()))?;
    if invite.approved {
        return Err(StubError::Conflict("Invite already approved".into()));
    }
    let otp = OtpCode::new(req.otp).map_err(|_| StubError::invalid_otp())?;
    if !state.approve_invite(&community.id, &email, &otp) {
        tracing::warn!(community_id = %community.id, email = %email, "approval OTP rejected");
        return Err(StubError::invalid_otp());
    }

    let updated = state
        .record_evidence(&community.id, |c| c.approvals += 1)
        .ok_or_else(StubError::community_not_found)?;
    let (approvals, status) = (updated.approvals, updated.status);

    tracing::info!(
        community_id = %community.id,
        approvals,
        status = %status,
        "authorized invite approved"
    );
    Ok(Json(json!({
        "message": "Approval recorded",
        "approvals": approvals,
        "status": status,
    })))
}

// ── Join requests ───────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JoinDecisionBody {
    community_id: String,
    user_id: String,
}

async fn request_join(
    State(state): State<AppState>,
    Extension(Caller(caller)): Extension<Caller>,
    Path(id): Path<String>,
) -> Result<Json<Value>, StubError> {
    let id = community_id(&id)?;
    match state.request_join(&id, &caller) {
        None => Err(StubError::community_not_found()),
        Some(JoinRequest::AlreadyMember) => {
            Err(StubError::Conflict("Already a member of this community".into()))
        }
        Some(JoinRequest::AlreadyRequested) => {
            Err(StubError::Conflict("Join request already pending".into()))
        }
        Some(JoinRequest::Filed) => {
            tracing::info!(community_id = %id, user_id = %caller, "join requested");
            Ok(Json(json!({ "message": "Join request sent" })))
        }
    }
}

fn decide_join(
    state: &AppState,
    payload: Result<Json<JoinDecisionBody>, JsonRejection>,
    accept: bool,
) -> Result<Json<Value>, StubError> {
    let req = body(payload)?;
    let id = community_id(&req.community_id)?;
    let user = UserId::new(req.user_id)?;
    match state.decide_join(&id, &user, accept) {
        None => Err(StubError::community_not_found()),
        Some(false) => Err(StubError::NotFound("No such join request".into())),
        Some(true) => {
            tracing::info!(community_id = %id, user_id = %user, accept, "join request decided");
            let message = if accept { "User approved" } else { "User rejected" };
            Ok(Json(json!({ "message": message })))
        }
    }
}

async fn approve_join(
    State(state): State<AppState>,
    payload: Result<Json<JoinDecisionBody>, JsonRejection>,
) -> Result<Json<Value>, StubError> {
    decide_join(&state, payload, true)
}

async fn reject_join(
    State(state): State<AppState>,
    payload: Result<Json<JoinDecisionBody>, JsonRejection>,
) -> Result<Json<Value>, StubError> {
    decide_join(&state, payload, false)
}

// ── Posts ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatePostBody {
    community_id: String,
    #[serde(default)]
    content: String,
    #[serde(rename = "type", default)]
    post_type: PostType,
    #[serde(default)]
    author_name: String,
    #[serde(default)]
    user_id: Option<String>,
}

fn post_not_found() -> StubError {
    StubError::NotFound("Post not found".into())
}

async fn list_posts(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<PostRecord>>, StubError> {
    let id = community_id(&id)?;
    load_community(&state, &id)?;
    Ok(Json(state.posts_of(&id)))
}

async fn create_post(
    State(state): State<AppState>,
    payload: Result<Json<CreatePostBody>, JsonRejection>,
) -> Result<(StatusCode, Json<PostRecord>), StubError> {
    let req = body(payload)?;
    let community = load_community(&state, &community_id(&req.community_id)?)?;
    let Some(raw_user) = req.user_id else {
        return Err(StubError::BadRequest("userId is required".into()));
    };
    let user = state
        .user(&UserId::new(raw_user)?)
        .ok_or_else(|| StubError::BadRequest("Unknown userId".into()))?;
    let content = req.content.trim();
    if content.is_empty() {
        return Err(ValidationError::EmptyPostContent.into());
    }
    let author_name = match req.author_name.trim() {
        "" => user.full_name.clone(),
        name => name.to_string(),
    };

    let id = new_post_id().map_err(|e| StubError::Internal(e.to_string()))?;
    let record = state.insert_post(PostRecord {
        id,
        community_id: community.id,
        content: content.to_string(),
        post_type: req.post_type,
        author_name,
        user_id: user.id,
        likes: 0,
        shares: 0,
        created_at: Utc::now(),
    });
    tracing::info!(post_id = %record.id, community_id = %record.community_id, "post created");
    Ok((StatusCode::CREATED, Json(record)))
}

fn react(state: &AppState, raw_id: &str, reaction: Reaction) -> Result<Json<PostRecord>, StubError> {
    let id = PostId::new(raw_id).map_err(|_| post_not_found())?;
    let updated = state.react(&id, reaction).ok_or_else(post_not_found)?;
    tracing::debug!(post_id = %id, ?reaction, "post reaction recorded");
    Ok(Json(updated))
}

async fn like_post(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> Result<Json<PostRecord>, StubError> {
    react(&state, &post_id, Reaction::Like)
}

async fn share_post(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> Result<Json<PostRecord>, StubError> {
    react(&state, &post_id, Reaction::Share)
}

async fn not_implemented() -> StatusCode {
    StatusCode::NOT_IMPLEMENTED
}
