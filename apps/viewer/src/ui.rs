//! The egui debug panel: live tuning for material and lights plus
//! read-only telemetry.

use glam::Vec3;
use lumen_scene::{FlashLight, MaterialLibrary, PointLight};

/// Minimum allowed point-light intensity; the input clamps up to this.
const MIN_INTENSITY: f32 = 1.0;

/// Mutable scene state the panel edits.
pub struct PanelState<'a> {
    pub draw_skybox: &'a mut bool,
    pub draw_pbr: &'a mut bool,
    pub shadows_enabled: &'a mut bool,
    pub materials: &'a mut MaterialLibrary,
    pub point_light: &'a mut PointLight,
    pub flash_light: &'a mut FlashLight,
}

/// Read-only values shown in the output section.
pub struct Telemetry<'a> {
    pub renderer_name: &'a str,
    pub fps: u32,
    pub camera_position: Vec3,
    pub camera_forward: Vec3,
}

/// Panel interactions the app has to act on.
#[derive(Debug, Default)]
pub struct UiResponse {
    /// The Continue button was clicked: leave UI focus, re-capture the
    /// cursor.
    pub continue_clicked: bool,
}

pub fn draw_debug_panel(
    ctx: &egui::Context,
    panel: PanelState<'_>,
    telemetry: &Telemetry<'_>,
) -> UiResponse {
    let mut response = UiResponse::default();

    egui::SidePanel::left("debug")
        .default_width(300.0)
        .show(ctx, |ui| {
            ui.heading("Debug");
            if ui.button("continue").clicked() {
                response.continue_clicked = true;
            }
            ui.separator();

            egui::CollapsingHeader::new("cook-torrance PBR material")
                .default_open(true)
                .show(ui, |ui| {
                    ui.checkbox(panel.draw_pbr, "enable cook-torrance PBR");
                    ui.checkbox(panel.draw_skybox, "render skybox");

                    let names: Vec<String> =
                        panel.materials.names().map(str::to_owned).collect();
                    let mut selected = panel.materials.current_index();
                    egui::ComboBox::from_label("material")
                        .selected_text(panel.materials.working().name.clone())
                        .show_ui(ui, |ui| {
                            for (i, name) in names.iter().enumerate() {
                                ui.selectable_value(&mut selected, i, name);
                            }
                        });
                    if selected != panel.materials.current_index() {
                        panel.materials.select(selected);
                    }

                    let material = panel.materials.working_mut();
                    ui.label("albedo color:");
                    ui.horizontal(|ui| {
                        ui.add(egui::Slider::new(&mut material.albedo.x, 0.0..=1.0).text("r"));
                        ui.add(egui::Slider::new(&mut material.albedo.y, 0.0..=1.0).text("g"));
                        ui.add(egui::Slider::new(&mut material.albedo.z, 0.0..=1.0).text("b"));
                    });
                    ui.add(egui::Slider::new(&mut material.metallic, 0.0..=1.0).text("metallic"));
                    ui.add(egui::Slider::new(&mut material.roughness, 0.0..=1.0).text("roughness"));
                    ui.add(egui::Slider::new(&mut material.ao, 0.1..=1.0).text("ao"));
                });

            egui::CollapsingHeader::new("light")
                .default_open(true)
                .show(ui, |ui| {
                    egui::CollapsingHeader::new("flash light").show(ui, |ui| {
                        ui.checkbox(&mut panel.flash_light.on, "enable");
                        ui.horizontal(|ui| {
                            ui.add(
                                egui::Slider::new(&mut panel.flash_light.color.x, 0.0..=1.0)
                                    .text("r"),
                            );
                            ui.add(
                                egui::Slider::new(&mut panel.flash_light.color.y, 0.0..=1.0)
                                    .text("g"),
                            );
                            ui.add(
                                egui::Slider::new(&mut panel.flash_light.color.z, 0.0..=1.0)
                                    .text("b"),
                            );
                        });
                    });

                    egui::CollapsingHeader::new("point light 1")
                        .default_open(true)
                        .show(ui, |ui| {
                            ui.label("light pos:");
                            ui.horizontal(|ui| {
                                ui.add(
                                    egui::DragValue::new(&mut panel.point_light.position.x)
                                        .prefix("X: ")
                                        .speed(0.02),
                                );
                                ui.add(
                                    egui::DragValue::new(&mut panel.point_light.position.y)
                                        .prefix("Y: ")
                                        .speed(0.02),
                                );
                                ui.add(
                                    egui::DragValue::new(&mut panel.point_light.position.z)
                                        .prefix("Z: ")
                                        .speed(0.02),
                                );
                            });
                            ui.checkbox(&mut panel.point_light.on, "enable");
                            ui.horizontal(|ui| {
                                ui.add(
                                    egui::Slider::new(&mut panel.point_light.color.x, 0.0..=1.0)
                                        .text("r"),
                                );
                                ui.add(
                                    egui::Slider::new(&mut panel.point_light.color.y, 0.0..=1.0)
                                        .text("g"),
                                );
                                ui.add(
                                    egui::Slider::new(&mut panel.point_light.color.z, 0.0..=1.0)
                                        .text("b"),
                                );
                            });
                            ui.horizontal(|ui| {
                                ui.label("intensity:");
                                ui.add(
                                    egui::DragValue::new(&mut panel.point_light.intensity)
                                        .speed(0.5),
                                );
                            });
                            panel.point_light.intensity =
                                panel.point_light.intensity.max(MIN_INTENSITY);
                            ui.checkbox(panel.shadows_enabled, "shadows");
                        });
                });

            egui::CollapsingHeader::new("output")
                .default_open(true)
                .show(ui, |ui| {
                    ui.label(format!("Renderer: {}", telemetry.renderer_name));
                    ui.label(format!("frame: {}", telemetry.fps));
                    let p = telemetry.camera_position;
                    ui.label(format!("camera pos: {:.2} {:.2} {:.2}", p.x, p.y, p.z));
                    let f = telemetry.camera_forward;
                    ui.label(format!("camera forward: {:.2} {:.2} {:.2}", f.x, f.y, f.z));
                });
        });

    response
}
