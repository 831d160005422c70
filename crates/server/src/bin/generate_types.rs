//! Writes the TypeScript bindings for the API payloads to `shared/types.ts`.

use std::{env, fs, path::PathBuf};

use ts_rs::TS;

fn main() -> anyhow::Result<()> {
    let decls = [
        utils::response::ApiResponse::<()>::decl(),
        db::models::user::Role::decl(),
        db::models::user::User::decl(),
        db::models::organisation::Organisation::decl(),
        db::models::organisation::UpdateOrganisation::decl(),
        db::models::invitation::Invitation::decl(),
        db::models::invitation::CreateInvitation::decl(),
        db::models::client::Client::decl(),
        db::models::client::CreateClient::decl(),
        db::models::client::UpdateClient::decl(),
        db::models::building::Building::decl(),
        db::models::building::BuildingWithFloors::decl(),
        db::models::building::NewFloor::decl(),
        db::models::building::CreateBuilding::decl(),
        db::models::building::UpdateBuilding::decl(),
        db::models::floor::Floor::decl(),
        db::models::floor::CreateFloor::decl(),
        db::models::floor::UpdateFloor::decl(),
        db::models::room_type::RoomType::decl(),
        db::models::room_type::CreateRoomType::decl(),
        db::models::room::Room::decl(),
        db::models::room::CreateRoom::decl(),
        db::models::room::UpdateRoom::decl(),
        db::models::checklist::ChecklistTemplate::decl(),
        db::models::checklist::ChecklistItem::decl(),
        db::models::checklist::RoomChecklistOverride::decl(),
        db::models::checklist::ChecklistTemplateWithItems::decl(),
        db::models::checklist::CreateChecklistTemplate::decl(),
        db::models::checklist::UpdateChecklistTemplate::decl(),
        db::models::checklist::CreateChecklistItem::decl(),
        db::models::checklist::UpdateChecklistItem::decl(),
        db::models::cleaning_activity::ActivityStatus::decl(),
        db::models::cleaning_activity::CleaningActivity::decl(),
        db::models::cleaning_activity::ActivitySummary::decl(),
        db::models::cleaning_activity::CreateCleaningActivity::decl(),
        db::models::cleaning_activity::UpdateCleaningActivity::decl(),
        db::models::activity_template::ActivityTemplate::decl(),
        db::models::activity_template::CreateActivityTemplate::decl(),
        db::models::room_task::RoomTaskStatus::decl(),
        db::models::room_task::InspectionOutcome::decl(),
        db::models::room_task::RoomTask::decl(),
        db::models::room_task::RoomTaskDetail::decl(),
        db::models::room_task::RoomAssignment::decl(),
        db::models::task_item_response::TaskItemResponse::decl(),
        db::models::task_item_response::UpsertTaskItemResponse::decl(),
        db::models::deficiency::DeficiencySeverity::decl(),
        db::models::deficiency::DeficiencyStatus::decl(),
        db::models::deficiency::Deficiency::decl(),
        db::models::deficiency::CreateDeficiency::decl(),
        db::models::deficiency::ResolveDeficiency::decl(),
        db::models::notification::Notification::decl(),
        services::services::activity::ActivityDetail::decl(),
        services::services::activity::AssignRoomTask::decl(),
        services::services::activity_template::TemplateFromActivity::decl(),
        services::services::deficiency::AssignDeficiency::decl(),
        services::services::notification::UnreadCount::decl(),
        services::services::report::StatusCounts::decl(),
        services::services::report::ActivityReport::decl(),
        services::services::room_task::RoomTaskView::decl(),
        services::services::room_task::FlagIssues::decl(),
        services::services::room_task::RaiseDeficiency::decl(),
        services::services::room_task::InspectRoomTask::decl(),
        services::services::room_task::InspectionResult::decl(),
        services::services::users::IssuedInvitation::decl(),
        services::services::users::ChangeRole::decl(),
        services::services::users::SetActive::decl(),
        services::services::users::AcceptedInvitation::decl(),
        server::routes::checklists::ReorderItems::decl(),
        server::routes::checklists::SetRoomChecklist::decl(),
        server::routes::rooms::RoomQrCode::decl(),
    ];

    let mut output = String::from("// This file was generated by `generate_types`. Do not edit.\n\n");
    for decl in decls {
        output.push_str("export ");
        output.push_str(&decl);
        output.push_str("\n\n");
    }

    let path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("shared/types.ts"));
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, output)?;
    println!("Wrote {}", path.display());
    Ok(())
}
