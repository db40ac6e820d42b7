mod entry;
mod export;
mod helpers;
mod info;
mod prompt;
mod setting;
mod stats;
mod weekly;

pub(crate) use entry::{
    cmd_entry_list, cmd_entry_search, cmd_entry_show, cmd_meditate, cmd_respond, cmd_today,
};
pub(crate) use export::{FormatArg, cmd_export};
pub(crate) use info::cmd_info;
pub(crate) use prompt::{
    cmd_prompt_add, cmd_prompt_delete, cmd_prompt_list, cmd_prompt_today, cmd_prompt_update,
};
pub(crate) use setting::{cmd_setting_get, cmd_setting_list, cmd_setting_set};
pub(crate) use stats::{cmd_heatmap, cmd_ratings, cmd_streak, cmd_trend};
pub(crate) use weekly::{cmd_weekly_reflect, cmd_weekly_show, cmd_weekly_summary};
