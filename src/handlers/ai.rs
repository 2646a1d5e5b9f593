// POST /api/ai/ask and GET /api/ai/conversations

use std::sync::Arc;

use super::respond;
use crate::models::{AiRequest, AuthUser, ConversationQuery};
use crate::usecase::AiUseCase;

pub async fn ask_handler(
    user: AuthUser,
    request: AiRequest,
    ai: Arc<dyn AiUseCase>,
) -> Result<impl warp::Reply, warp::Rejection> {
    Ok(respond(ai.process_ai_request(&user.id, request).await))
}

pub async fn conversations_handler(
    user: AuthUser,
    query: ConversationQuery,
    ai: Arc<dyn AiUseCase>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let limit = query.limit.unwrap_or(0);
    Ok(respond(ai.list_conversations(&user.id, limit).await))
}
