pub mod services;

use services::generate::GeneratorState;

pub fn run() {
    tauri::Builder::default()
        .plugin(
            tauri_plugin_log::Builder::new()
                .level(log::LevelFilter::Info)
                .build(),
        )
        .manage(GeneratorState::default())
        .invoke_handler(tauri::generate_handler![
            services::config::get_public_config,
            services::models::list_models,
            services::generate::generate_create,
            services::generate::generate_modify,
            services::generate::get_session,
            services::publish::publish_app,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
