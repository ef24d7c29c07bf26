use super::App;
use crate::scene::VolumeColor;

/// One-shot requests collected from the side panel.
#[derive(Default)]
pub(super) struct UiActions {
    pub load_archive: bool,
    pub previous_screen: bool,
    pub next_screen: bool,
    pub apply_json: bool,
    pub save_edit: bool,
    pub delete_selected: bool,
    pub close_selection: bool,
    pub export: bool,
}

#[derive(Clone)]
pub(super) struct EditDraft {
    pub json: String,
    pub information: String,
    pub dirty: bool,
}

pub(super) struct EditorUiParams {
    pub raw_input: egui::RawInput,
    pub screen_label: String,
    pub can_navigate: bool,
    pub screen_name: String,
    pub json_text: String,
    pub archive_input: String,
    pub selection_title: Option<String>,
    pub edit_draft: Option<EditDraft>,
    pub volume_count: usize,
    pub element_count: usize,
    pub labeled_count: usize,
    pub status: Option<String>,
    pub tooltip: Option<(egui::Pos2, String)>,
    pub screenshot: Option<(egui::TextureId, egui::Vec2)>,
    pub screenshot_enlarged: bool,
}

pub(super) struct EditorUiOutput {
    pub full_output: egui::FullOutput,
    pub screen_name: String,
    pub json_text: String,
    pub archive_input: String,
    pub edit_draft: Option<EditDraft>,
    pub screenshot_enlarged: bool,
    pub actions: UiActions,
}

fn legend_row(ui: &mut egui::Ui, color: VolumeColor, label: &str) {
    let [r, g, b] = color.rgb8();
    let swatch = egui::Color32::from_rgb(r, g, b);
    ui.horizontal(|ui| {
        let (rect, _) =
            ui.allocate_exact_size(egui::vec2(12.0, 12.0), egui::Sense::hover());
        ui.painter().rect_filled(rect, 2.0, swatch);
        ui.label(label);
    });
}

impl App {
    pub(super) fn render_editor_ui(&mut self, params: EditorUiParams) -> EditorUiOutput {
        let EditorUiParams {
            raw_input,
            screen_label,
            can_navigate,
            mut screen_name,
            mut json_text,
            mut archive_input,
            selection_title,
            mut edit_draft,
            volume_count,
            element_count,
            labeled_count,
            status,
            tooltip,
            screenshot,
            mut screenshot_enlarged,
        } = params;

        let mut actions = UiActions::default();

        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            egui::SidePanel::left("strata_left_panel").default_width(360.0).show(ctx, |ui| {
                ui.heading("Screens");
                ui.horizontal(|ui| {
                    ui.label("Archive:");
                    ui.add(
                        egui::TextEdit::singleline(&mut archive_input)
                            .hint_text("path/to/screens.zip")
                            .desired_width(180.0),
                    );
                    if ui.button("Load").clicked() {
                        actions.load_archive = true;
                    }
                });
                ui.horizontal(|ui| {
                    if ui.add_enabled(can_navigate, egui::Button::new("Previous")).clicked() {
                        actions.previous_screen = true;
                    }
                    ui.label(&screen_label);
                    if ui.add_enabled(can_navigate, egui::Button::new("Next")).clicked() {
                        actions.next_screen = true;
                    }
                });
                ui.horizontal(|ui| {
                    ui.label("Name:");
                    ui.text_edit_singleline(&mut screen_name);
                });

                if let Some((texture_id, size)) = screenshot {
                    ui.separator();
                    let thumb_width = 140.0_f32.min(size.x);
                    let thumb = egui::vec2(thumb_width, thumb_width * size.y / size.x.max(1.0));
                    let response = ui
                        .add(egui::Image::new((texture_id, thumb)).sense(egui::Sense::click()));
                    if response.clicked() {
                        screenshot_enlarged = !screenshot_enlarged;
                    }
                    response.on_hover_text("Click to enlarge");
                }

                ui.separator();
                ui.heading("Elements");
                ui.label(format!(
                    "{volume_count} rendered / {element_count} total, {labeled_count} labeled"
                ));
                legend_row(ui, VolumeColor::Highlighted, "Selected");
                legend_row(ui, VolumeColor::Labeled, "Labeled");
                legend_row(ui, VolumeColor::Clickable, "Clickable");
                legend_row(ui, VolumeColor::Default, "Other");

                ui.separator();
                egui::ScrollArea::vertical().id_salt("screen_json").max_height(220.0).show(
                    ui,
                    |ui| {
                        let response = ui.add(
                            egui::TextEdit::multiline(&mut json_text)
                                .code_editor()
                                .desired_width(f32::INFINITY)
                                .desired_rows(10),
                        );
                        if response.changed() {
                            actions.apply_json = true;
                        }
                    },
                );

                if let Some(draft) = edit_draft.as_mut() {
                    ui.separator();
                    ui.heading(
                        selection_title.as_deref().map_or_else(
                            || "Selected element".to_string(),
                            |title| format!("Selected: {title}"),
                        ),
                    );
                    egui::ScrollArea::vertical().id_salt("edit_json").max_height(180.0).show(
                        ui,
                        |ui| {
                            ui.add(
                                egui::TextEdit::multiline(&mut draft.json)
                                    .code_editor()
                                    .desired_width(f32::INFINITY)
                                    .desired_rows(8),
                            );
                        },
                    );
                    ui.horizontal(|ui| {
                        ui.label("Information:");
                        ui.text_edit_singleline(&mut draft.information);
                    });
                    ui.horizontal(|ui| {
                        if ui
                            .add_enabled(draft.dirty, egui::Button::new("Save Changes"))
                            .clicked()
                        {
                            actions.save_edit = true;
                        }
                        if ui.button("Delete").clicked() {
                            actions.delete_selected = true;
                        }
                        if ui.button("Close").clicked() {
                            actions.close_selection = true;
                        }
                    });
                    ui.small("Press Q to delete the selected element");
                }

                ui.separator();
                if ui.button("Export JSON").clicked() {
                    actions.export = true;
                }

                if let Some(message) = &status {
                    ui.separator();
                    ui.colored_label(egui::Color32::LIGHT_YELLOW, message);
                }
            });

            if screenshot_enlarged {
                if let Some((texture_id, size)) = screenshot {
                    egui::Window::new("Screenshot")
                        .open(&mut screenshot_enlarged)
                        .resizable(true)
                        .default_width(420.0)
                        .show(ctx, |ui| {
                            let available = ui.available_width();
                            let scaled =
                                egui::vec2(available, available * size.y / size.x.max(1.0));
                            ui.add(egui::Image::new((texture_id, scaled)));
                        });
                }
            }

            if let Some((pos, text)) = &tooltip {
                egui::Area::new(egui::Id::new("hover_tooltip"))
                    .fixed_pos(*pos)
                    .interactable(false)
                    .show(ctx, |ui| {
                        egui::Frame::popup(ui.style()).show(ui, |ui| {
                            ui.label(text);
                        });
                    });
            }
        });

        EditorUiOutput {
            full_output,
            screen_name,
            json_text,
            archive_input,
            edit_draft,
            screenshot_enlarged,
            actions,
        }
    }
}
