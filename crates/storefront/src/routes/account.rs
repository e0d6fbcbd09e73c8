//! Account route handlers: addresses and profile.
//!
//! These routes require authentication.

use axum::{
    Json,
    extract::{Multipart, Path, State, rejection::JsonRejection},
};
use tower_sessions::Session;

use karya_core::{AddressId, ImageUpdate};

use crate::db::{AddressRepository, UserRepository};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::auth::{OptionalAuth, RequireAuth};
use crate::models::{Address, AddressInput, User};
use crate::services::account::{AddressWorkflow, ProfileUpdate, ProfileWorkflow};
use crate::services::outcome::ActionOutcome;
use crate::state::AppState;

use super::json_body;

fn validated_address(
    payload: std::result::Result<Json<AddressInput>, JsonRejection>,
) -> std::result::Result<AddressInput, ActionOutcome> {
    json_body(payload)?
        .validate()
        .map_err(ActionOutcome::validation)
}

/// `GET /account/addresses`
pub async fn addresses(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Address>>> {
    let store = AddressRepository::new(state.pool());
    let addresses = state.pages().addresses(user.id, &store).await?;
    Ok(Json(addresses.as_ref().clone()))
}

/// `POST /account/addresses`
pub async fn create_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    payload: std::result::Result<Json<AddressInput>, JsonRejection>,
) -> ActionOutcome {
    let input = match validated_address(payload) {
        Ok(input) => input,
        Err(outcome) => return outcome,
    };

    let store = AddressRepository::new(state.pool());
    AddressWorkflow::new(&store, state.pages())
        .create(user.id, &input)
        .await
}

/// `POST /account/addresses/{id}`
pub async fn edit_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AddressId>,
    payload: std::result::Result<Json<AddressInput>, JsonRejection>,
) -> ActionOutcome {
    let input = match validated_address(payload) {
        Ok(input) => input,
        Err(outcome) => return outcome,
    };

    let store = AddressRepository::new(state.pool());
    AddressWorkflow::new(&store, state.pages())
        .edit(user.id, id, &input)
        .await
}

/// `DELETE /account/addresses/{id}`
pub async fn delete_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AddressId>,
) -> ActionOutcome {
    let store = AddressRepository::new(state.pool());
    AddressWorkflow::new(&store, state.pages())
        .delete(user.id, id)
        .await
}

/// `POST /account/addresses/{id}/active`
pub async fn set_active_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AddressId>,
) -> ActionOutcome {
    add_breadcrumb("account", "Set active address", &[("address_id", id.to_string())]);

    let store = AddressRepository::new(state.pool());
    AddressWorkflow::new(&store, state.pages())
        .set_active(user.id, id)
        .await
}

/// `GET /account/profile`
pub async fn profile(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<User>> {
    let users = UserRepository::new(state.pool());
    let profile = state
        .pages()
        .profile(user.id, &users)
        .await?
        .ok_or_else(|| AppError::NotFound("user".to_owned()))?;
    Ok(Json(profile.as_ref().clone()))
}

/// Text fields and picture of the profile form.
#[derive(Default)]
struct ProfileForm {
    username: String,
    full_name: String,
    phone: String,
    image: Option<Vec<u8>>,
}

impl ProfileForm {
    fn into_update(self) -> ProfileUpdate {
        ProfileUpdate {
            username: self.username,
            full_name: self.full_name,
            phone: self.phone,
            image: ImageUpdate::from_upload(self.image),
        }
    }
}

async fn read_profile_form(mut multipart: Multipart) -> std::result::Result<ProfileForm, String> {
    let mut form = ProfileForm::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| e.body_text())? {
        let Some(name) = field.name().map(ToOwned::to_owned) else {
            continue;
        };
        match name.as_str() {
            "username" => form.username = field.text().await.map_err(|e| e.body_text())?,
            "fullName" => form.full_name = field.text().await.map_err(|e| e.body_text())?,
            "phone" => form.phone = field.text().await.map_err(|e| e.body_text())?,
            // A plain text value here means "no new file".
            "image" if field.file_name().is_some() => {
                form.image = Some(field.bytes().await.map_err(|e| e.body_text())?.to_vec());
            }
            _ => {}
        }
    }

    Ok(form)
}

/// `POST /account/profile`
///
/// Multipart fields: `username`, `fullName`, `phone`, `image` (optional file).
/// The image being replaced is whatever the store holds when the write lands,
/// never a value taken from the form.
pub async fn update_profile(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    session: Session,
    multipart: Multipart,
) -> ActionOutcome {
    let users = UserRepository::new(state.pool());
    let workflow = ProfileWorkflow::new(
        &users,
        state.images(),
        state.pages(),
        &state.config().cloudinary.folder,
    );

    let Some(user) = user else {
        return workflow
            .update(None, &session, ProfileUpdate::default())
            .await;
    };

    let form = match read_profile_form(multipart).await {
        Ok(form) => form,
        Err(message) => return ActionOutcome::validation(message),
    };
    let update = match form.into_update().validate() {
        Ok(update) => update,
        Err(message) => return ActionOutcome::validation(message),
    };

    add_breadcrumb(
        "account",
        "Update profile",
        &[("new_image", update.image.is_new().to_string())],
    );
    workflow.update(Some(&user), &session, update).await
}
