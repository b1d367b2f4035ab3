use crate::api::Mode;
use crate::app::{App, Applied};
use crate::args::SetSettingsArgs;
use crate::commands::Out;
use crate::model::{Settings, SettingsPatch};
use crate::{Config, Error, Result};

pub async fn settings_show(config: Config, mode: Mode) -> Result<Out<Settings>> {
    let app = App::open(config, mode).await?;
    let settings = app.state().settings().clone();
    Ok(Out::new(describe(&settings), settings))
}

pub async fn settings_set(
    config: Config,
    mode: Mode,
    args: &SetSettingsArgs,
) -> Result<Out<Settings>> {
    let mut app = App::open(config, mode).await?;
    let theme = if args.next_theme() {
        Some(app.state().settings().theme().next())
    } else {
        args.theme()
    };
    let patch = SettingsPatch {
        default_currency: args.currency(),
        theme,
        user_name: args.user_name().map(str::to_string),
    };
    if patch.is_empty() {
        return Err(Error::validation(
            "Nothing to change. Pass --currency, --theme, --user-name or --next-theme",
        ));
    }

    let Applied { value, warnings } = app.save_settings(patch).await?;
    Ok(Out::new(describe(&value), value).with_warnings(&warnings))
}

fn describe(settings: &Settings) -> String {
    format!(
        "User: {}, default currency: {}, theme: {}",
        settings.user_name(),
        settings.default_currency(),
        settings.theme()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Currency, Theme};
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_settings_show_defaults() {
        let env = TestEnv::new().await;
        let out = settings_show(env.config(), Mode::Testing).await.unwrap();
        assert_eq!(out.message(), "User: User, default currency: GHS, theme: glass");
    }

    #[tokio::test]
    async fn test_settings_set() {
        let env = TestEnv::new().await;
        let args = SetSettingsArgs::new(Some(Currency::Eur), None, Some("Esi".into()), false);
        settings_set(env.config(), Mode::Testing, &args).await.unwrap();

        let args = SetSettingsArgs::new(None, None, None, true);
        let out = settings_set(env.config(), Mode::Testing, &args).await.unwrap();
        let settings = out.structure().unwrap();
        assert_eq!(settings.default_currency(), Currency::Eur);
        assert_eq!(settings.user_name(), "Esi");
        assert_eq!(settings.theme(), Theme::Light);
    }

    #[tokio::test]
    async fn test_settings_set_nothing() {
        let env = TestEnv::new().await;
        let err = settings_set(env.config(), Mode::Testing, &SetSettingsArgs::default())
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }
}
