#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

fn main() {
    fieldcrew_tauri::run();
}
