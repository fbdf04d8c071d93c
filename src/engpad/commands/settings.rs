use crate::commands::config::ConfigAction;
use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::store::DocumentStore;

/// Show or change the application preferences kept in the store.
pub async fn run<S: DocumentStore>(store: &S, action: ConfigAction) -> Result<CmdResult> {
    let mut settings = store.load_settings().await?;
    match action {
        ConfigAction::ShowAll => Ok(CmdResult::default().with_settings(settings)),
        ConfigAction::ShowKey(key) => {
            let mut result = CmdResult::default();
            match settings.get(&key) {
                Some(val) => result.add_message(CmdMessage::info(val)),
                None => result.add_message(CmdMessage::error(format!("Unknown setting: {}", key))),
            }
            Ok(result)
        }
        ConfigAction::Set(key, value) => {
            if let Err(e) = settings.set(&key, &value) {
                let mut res = CmdResult::default();
                res.add_message(CmdMessage::error(e));
                return Ok(res);
            }
            store.save_settings(&settings).await?;
            let display_val = settings.get(&key).unwrap_or(value);
            let mut result = CmdResult::default().with_settings(settings);
            result.add_message(CmdMessage::success(format!("{} set to {}", key, display_val)));
            Ok(result)
        }
    }
}
