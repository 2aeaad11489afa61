use super::media_routes::{json_error, read_upload_form};
use super::session::{resolve_session, EditModeSession};
use super::state::{GuardedBlobRegistry, GuardedBoardState, GuardedMediaLibrary, ServerState};
use super::ServerConfig;
use crate::board::{
    filter_sections, Actor, BoardError, BoardFilter, CountryFilter, LoadOutcome, Section,
    SoundMeta,
};
use crate::media::attach_uploaded_audio;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

impl IntoResponse for BoardError {
    fn into_response(self) -> Response {
        json_error(StatusCode::NOT_FOUND, &self.to_string())
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct BoardQuery {
    country: Option<String>,
    actors: Option<String>,
    sfw_only: Option<String>,
}

fn parse_flag(value: &str) -> Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "false" | "0" => Ok(false),
        "true" | "1" => Ok(true),
        other => Err(format!("Invalid sfwOnly value {}", other)),
    }
}

impl TryFrom<BoardQuery> for BoardFilter {
    type Error = String;

    fn try_from(query: BoardQuery) -> Result<Self, Self::Error> {
        let country = match query.country {
            Some(country) => country.parse::<CountryFilter>()?,
            None => CountryFilter::All,
        };

        let mut actors = std::collections::BTreeSet::new();
        for name in query.actors.iter().flat_map(|list| list.split(',')) {
            if name.trim().is_empty() {
                continue;
            }
            let actor = Actor::parse(name).ok_or_else(|| format!("Unknown actor {}", name))?;
            actors.insert(actor);
        }

        let sfw_only = match query.sfw_only {
            Some(value) => parse_flag(&value)?,
            None => false,
        };

        Ok(BoardFilter {
            country,
            actors,
            sfw_only,
        })
    }
}

#[derive(Serialize)]
struct BoardResponse {
    sections: Vec<Section>,
}

#[derive(Serialize)]
struct ReloadResponse {
    outcome: LoadOutcome,
    sections: Vec<Section>,
}

#[derive(Deserialize, Debug)]
struct TitleBody {
    title: String,
}

#[derive(Deserialize, Debug)]
struct LabelBody {
    label: String,
}

#[derive(Deserialize, Debug)]
struct AudioUrlBody {
    url: String,
}

async fn get_board(
    State(board): State<GuardedBoardState>,
    Query(query): Query<BoardQuery>,
) -> Response {
    let filter = match BoardFilter::try_from(query) {
        Ok(filter) => filter,
        Err(message) => return json_error(StatusCode::BAD_REQUEST, &message),
    };
    let sections = board.sections();
    let sections = if filter.is_noop() {
        sections.as_ref().clone()
    } else {
        filter_sections(&sections, &filter)
    };
    Json(BoardResponse { sections }).into_response()
}

async fn reload_board(_session: EditModeSession, State(board): State<GuardedBoardState>) -> Response {
    let outcome = board.load_board().await;
    info!("Board reloaded: {:?}", outcome);
    Json(ReloadResponse {
        outcome,
        sections: board.sections().as_ref().clone(),
    })
    .into_response()
}

async fn add_section(_session: EditModeSession, State(board): State<GuardedBoardState>) -> Response {
    let section = board.add_section().await;
    (StatusCode::CREATED, Json(section)).into_response()
}

async fn remove_section(
    _session: EditModeSession,
    State(board): State<GuardedBoardState>,
    Path(section_id): Path<String>,
) -> Result<StatusCode, BoardError> {
    board.remove_section(&section_id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn put_section_title(
    _session: EditModeSession,
    State(board): State<GuardedBoardState>,
    Path(section_id): Path<String>,
    Json(body): Json<TitleBody>,
) -> Result<StatusCode, BoardError> {
    board.set_section_title(&section_id, &body.title)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_sound(
    _session: EditModeSession,
    State(board): State<GuardedBoardState>,
    Path(section_id): Path<String>,
) -> Result<Response, BoardError> {
    let sound = board.add_sound(&section_id).await?;
    Ok((StatusCode::CREATED, Json(sound)).into_response())
}

async fn put_sound_label(
    _session: EditModeSession,
    State(board): State<GuardedBoardState>,
    Path((section_id, sound_id)): Path<(String, String)>,
    Json(body): Json<LabelBody>,
) -> Result<StatusCode, BoardError> {
    board.set_sound_label(&section_id, &sound_id, &body.label)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn put_sound_audio(
    _session: EditModeSession,
    State(board): State<GuardedBoardState>,
    Path((section_id, sound_id)): Path<(String, String)>,
    Json(body): Json<AudioUrlBody>,
) -> Result<StatusCode, BoardError> {
    board.set_sound_audio(&section_id, &sound_id, &body.url)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Stores the uploaded file through the fallback chain and points the
/// sound at the result.
async fn upload_sound_audio(
    _session: EditModeSession,
    State(board): State<GuardedBoardState>,
    State(media): State<GuardedMediaLibrary>,
    State(blobs): State<GuardedBlobRegistry>,
    State(config): State<ServerConfig>,
    Path((section_id, sound_id)): Path<(String, String)>,
    multipart: Multipart,
) -> Result<Response, BoardError> {
    {
        let sections = board.sections();
        let section = sections
            .iter()
            .find(|section| section.id == section_id)
            .ok_or_else(|| BoardError::SectionNotFound(section_id.clone()))?;
        section
            .find_sound(&sound_id)
            .ok_or_else(|| BoardError::SoundNotFound(sound_id.clone()))?;
    }

    let upload = match read_upload_form(multipart).await {
        Ok(Some(upload)) => upload,
        Ok(None) => return Ok(json_error(StatusCode::BAD_REQUEST, "No file provided")),
        Err(err) => {
            warn!("Could not read audio upload for {}: {}", sound_id, err);
            return Ok(json_error(StatusCode::BAD_REQUEST, "Invalid upload"));
        }
    };

    let attached =
        attach_uploaded_audio(&media, &blobs, upload, config.max_inline_audio_bytes).await;
    board.set_sound_audio(&section_id, &sound_id, &attached.url)?;
    info!("Sound {} now plays audio via {:?}", sound_id, attached.via);
    Ok(Json(attached).into_response())
}

async fn patch_sound_meta(
    _session: EditModeSession,
    State(board): State<GuardedBoardState>,
    Path((section_id, sound_id)): Path<(String, String)>,
    Json(patch): Json<SoundMeta>,
) -> Result<Json<SoundMeta>, BoardError> {
    let merged = board.set_sound_meta(&section_id, &sound_id, patch)?;
    Ok(Json(merged))
}

pub fn make_board_routes(state: ServerState) -> Router {
    let mutations = Router::new()
        .route("/api/board/reload", post(reload_board))
        .route("/api/board/sections", post(add_section))
        .route("/api/board/sections/{section_id}", delete(remove_section))
        .route("/api/board/sections/{section_id}/title", put(put_section_title))
        .route("/api/board/sections/{section_id}/sounds", post(add_sound))
        .route(
            "/api/board/sections/{section_id}/sounds/{sound_id}/label",
            put(put_sound_label),
        )
        .route(
            "/api/board/sections/{section_id}/sounds/{sound_id}/audio",
            put(put_sound_audio).post(upload_sound_audio),
        )
        .route(
            "/api/board/sections/{section_id}/sounds/{sound_id}/meta",
            patch(patch_sound_meta),
        )
        .route_layer(middleware::from_fn_with_state(
            state.sessions.clone(),
            resolve_session,
        ));

    Router::new()
        .route("/api/board", get(get_board))
        .merge(mutations)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Country;
    use crate::server::server::tests::test_app;
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    fn query(country: Option<&str>, actors: Option<&str>, sfw_only: Option<&str>) -> BoardQuery {
        BoardQuery {
            country: country.map(str::to_string),
            actors: actors.map(str::to_string),
            sfw_only: sfw_only.map(str::to_string),
        }
    }

    #[test]
    fn empty_query_is_noop_filter() {
        let filter = BoardFilter::try_from(BoardQuery::default()).unwrap();
        assert!(filter.is_noop());
    }

    #[test]
    fn parses_all_filter_params() {
        let filter =
            BoardFilter::try_from(query(Some("uk"), Some("Daisy, nick,"), Some("true"))).unwrap();
        assert_eq!(filter.country, CountryFilter::Only(Country::UK));
        assert_eq!(
            filter.actors.into_iter().collect::<Vec<_>>(),
            vec![Actor::Daisy, Actor::Nick]
        );
        assert!(filter.sfw_only);
    }

    #[test]
    fn rejects_unknown_values() {
        assert!(BoardFilter::try_from(query(Some("FR"), None, None)).is_err());
        assert!(BoardFilter::try_from(query(None, Some("Bob"), None)).is_err());
        assert!(BoardFilter::try_from(query(None, None, Some("maybe"))).is_err());
    }

    #[tokio::test]
    async fn bad_filter_is_bad_request() {
        let app = test_app().await;
        let request = Request::builder()
            .uri("/api/board?country=mars")
            .body(Body::empty())
            .unwrap();
        let response = app.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn mutations_need_edit_mode() {
        let app = test_app().await;
        let section_id = app.board.sections()[0].id.clone();

        let request = Request::builder()
            .method("POST")
            .uri(format!("/api/board/sections/{}/sounds", section_id))
            .body(Body::empty())
            .unwrap();
        let response = app.router.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(app.board.sections()[0].sounds.len(), 4);
    }
}
