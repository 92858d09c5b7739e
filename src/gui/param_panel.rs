use std::time::SystemTime;

use egui::{Color32, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::{
    gui::tooltip::{collapsible_section, label_no_wrap},
    params::form::{Field, ParamForm, ParamPatch, ValidationError},
    topology::snapshot::ParamValues,
};

/// What the operator asked for this frame.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelAction {
    None,
    Submit(ParamPatch),
    Invalid(ValidationError),
    Close,
}

/// Read-only context of the drawer.
pub struct PanelStatus<'a> {
    pub values: &'a ParamValues,
    pub last_poll: Option<SystemTime>,
    pub last_error: Option<&'a str>,
    pub submitting: bool,
}

pub fn current_value(values: &ParamValues, field: Field) -> Option<f64> {
    match field {
        Field::SourceDl => values.s_dl_thr,
        Field::SourceUl => values.s_ul_thr,
        Field::TargetDl => values.t_dl_thr,
        Field::TargetUl => values.t_ul_thr,
        Field::Rsrq => values.rsrq_thr,
        Field::MinUe => values.min_ue,
        Field::MaxHoFrom => values.max_ho_from,
        Field::MaxHoTo => values.max_ho_to,
        Field::Every => values.every,
    }
}

fn format_value(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) if unit.is_empty() => v.to_string(),
        Some(v) => format!("{} {}", v, unit),
        None => "-".to_string(),
    }
}

fn on_off(value: Option<bool>) -> &'static str {
    match value {
        Some(true) => "On",
        Some(false) => "Off",
        None => "-",
    }
}

/// Parameter drawer: current values next to the edit fields, then the
/// Submit / Close buttons. Validation runs on Submit; nothing leaves this
/// function unless every filled-in field passes.
pub fn show(ui: &mut Ui, form: &mut ParamForm, status: &PanelStatus) -> PanelAction {
    let mut action = PanelAction::None;

    ui.heading("Handover parameters");
    ui.add_space(4.0);

    collapsible_section(ui, "Status", true, |ui| {
        let polled = status
            .last_poll
            .map(|t| humantime::format_rfc3339_seconds(t).to_string())
            .unwrap_or_else(|| "never".to_string());
        ui.add(label_no_wrap(format!("Last update: {}", polled)));
        if let Some(err) = status.last_error {
            ui.add(label_no_wrap(
                RichText::new(format!("Last error: {}", err)).color(Color32::from_rgb(0xd2, 0x0f, 0x39)),
            ));
        }
    });

    ui.add_space(6.0);

    let table = TableBuilder::new(ui)
        .striped(true)
        .resizable(false)
        .column(Column::auto().at_least(190.0))
        .column(Column::auto().at_least(70.0))
        .column(Column::remainder().at_least(90.0));

    table
        .header(20.0, |mut header| {
            header.col(|ui| {
                ui.strong("Parameter");
            });
            header.col(|ui| {
                ui.strong("Current");
            });
            header.col(|ui| {
                ui.strong("New value");
            });
        })
        .body(|mut body| {
            body.row(24.0, |mut row| {
                row.col(|ui| {
                    ui.label("Load balancing");
                });
                row.col(|ui| {
                    ui.label(on_off(status.values.load_balance));
                });
                row.col(|ui| {
                    // Follows the controller until the operator picks a side
                    let mut choice = form.load_balance.or(status.values.load_balance);
                    ui.horizontal(|ui| {
                        let on = ui.radio_value(&mut choice, Some(true), "On");
                        let off = ui.radio_value(&mut choice, Some(false), "Off");
                        if on.changed() || off.changed() {
                            form.load_balance = choice;
                        }
                    });
                });
            });

            for field in Field::ALL {
                body.row(24.0, |mut row| {
                    row.col(|ui| {
                        ui.label(field.label());
                    });
                    row.col(|ui| {
                        ui.label(format_value(current_value(status.values, field), field.unit()));
                    });
                    row.col(|ui| {
                        ui.add(
                            egui::TextEdit::singleline(form.field_mut(field))
                                .hint_text(field.unit())
                                .desired_width(90.0),
                        );
                    });
                });
            }
        });

    ui.add_space(8.0);
    ui.horizontal(|ui| {
        let submit = ui.add_enabled(!status.submitting, egui::Button::new("Submit"));
        if submit.clicked() {
            action = match form.validate() {
                Ok(patch) => PanelAction::Submit(patch),
                Err(err) => PanelAction::Invalid(err),
            };
        }
        if ui.button("Close").clicked() {
            action = PanelAction::Close;
        }
        if status.submitting {
            ui.spinner();
        }
    });

    action
}
