/*
 * Handover parameter editing: the raw form, its validation rules, and the
 * sparse patch submitted back to the controller.
 */

pub mod form;
