use std::fs;

use recipe_core::recipe_step;

// Copia un ingrediente sin cambios (p.ej. para retener una fuente bajo otra
// ruta del paquete).
recipe_step! {
    step CopyIngredient {
        fields { binding: String },
        description: "Copy an ingredient unchanged",
        run(this, ctx) {
            fs::copy(ctx.ingredient(&this.binding)?, ctx.output())?;
        }
    }
}

recipe_step! {
    step Uppercase {
        fields { binding: String },
        description: "Uppercase a text ingredient",
        run(this, ctx) {
            let text = fs::read_to_string(ctx.ingredient(&this.binding)?)?;
            fs::write(ctx.output(), text.to_uppercase())?;
        }
    }
}
